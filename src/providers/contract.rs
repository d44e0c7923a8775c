//! ERC-721 read-only binding
//!
//! `NftContract` is the seam the discovery engine talks to. `RpcNftContract`
//! implements it with `sol!`-encoded eth_calls and eth_getLogs over
//! `RpcProvider`; tests swap in in-memory collections.

use alloy_primitives::{Address, U256};
use alloy_sol_types::{sol, SolCall, SolEvent};

use crate::models::errors::{AppError, AppResult};
use crate::models::types::{BlockRange, TransferEvent};
use crate::providers::rpc::{LogFilter, RpcLog, RpcProvider};
use crate::utils::decoder::{
    address_key, parse_hex_u64, to_hex_quantity, topic_to_address, topic_to_u256,
};

// ERC-721 + Enumerable surface
sol! {
    function name() external view returns (string memory);
    function symbol() external view returns (string memory);
    function balanceOf(address owner) external view returns (uint256);
    function ownerOf(uint256 tokenId) external view returns (address);
    function tokenURI(uint256 tokenId) external view returns (string memory);
    function totalSupply() external view returns (uint256);
    function tokenByIndex(uint256 index) external view returns (uint256);
    function tokenOfOwnerByIndex(address owner, uint256 index) external view returns (uint256);

    event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);
}

/// Read-only view of an ERC-721 collection
#[allow(async_fn_in_trait)]
pub trait NftContract {
    /// Contract address (registry key form)
    fn address(&self) -> String;

    async fn name(&self) -> AppResult<String>;

    async fn symbol(&self) -> AppResult<String>;

    /// Enumerable extension; reverts on plain ERC-721
    async fn total_supply(&self) -> AppResult<U256>;

    /// Enumerable extension
    async fn token_by_index(&self, index: U256) -> AppResult<U256>;

    /// Reverts (`CallReverted`) for tokens that don't exist
    async fn owner_of(&self, token_id: U256) -> AppResult<Address>;

    /// Current chain head
    async fn block_number(&self) -> AppResult<u64>;

    /// ERC-721 Transfer logs emitted by this contract inside `range`
    async fn transfer_logs(&self, range: BlockRange) -> AppResult<Vec<TransferEvent>>;
}

/// `NftContract` backed by a JSON-RPC node
#[derive(Clone)]
pub struct RpcNftContract {
    provider: RpcProvider,
    address: Address,
}

impl RpcNftContract {
    pub fn new(provider: RpcProvider, address: Address) -> Self {
        Self { provider, address }
    }

    pub fn provider(&self) -> &RpcProvider {
        &self.provider
    }

    async fn call_raw(&self, data: Vec<u8>) -> AppResult<Vec<u8>> {
        let out = self.provider.eth_call(&self.address(), &data).await?;
        // Some nodes answer a revert with empty return data instead of an error
        if out.is_empty() {
            return Err(AppError::reverted("empty return data"));
        }
        Ok(out.to_vec())
    }

    /// Encode, call and decode a view function
    async fn view<C: SolCall>(&self, call: C) -> AppResult<C::Return> {
        let out = self.call_raw(call.abi_encode()).await?;
        C::abi_decode_returns(&out, false).map_err(|e| {
            AppError::reverted(format!("{}: undecodable return data: {}", C::SIGNATURE, e))
        })
    }
}

impl NftContract for RpcNftContract {
    fn address(&self) -> String {
        address_key(&self.address)
    }

    async fn name(&self) -> AppResult<String> {
        Ok(self.view(nameCall {}).await?._0)
    }

    async fn symbol(&self) -> AppResult<String> {
        Ok(self.view(symbolCall {}).await?._0)
    }

    async fn total_supply(&self) -> AppResult<U256> {
        Ok(self.view(totalSupplyCall {}).await?._0)
    }

    async fn token_by_index(&self, index: U256) -> AppResult<U256> {
        Ok(self.view(tokenByIndexCall { index }).await?._0)
    }

    async fn owner_of(&self, token_id: U256) -> AppResult<Address> {
        let owner = self.view(ownerOfCall { tokenId: token_id }).await?._0;
        if owner == Address::ZERO {
            return Err(AppError::reverted(format!("token {} has no owner", token_id)));
        }
        Ok(owner)
    }

    async fn block_number(&self) -> AppResult<u64> {
        self.provider.block_number().await
    }

    async fn transfer_logs(&self, range: BlockRange) -> AppResult<Vec<TransferEvent>> {
        let filter = LogFilter {
            address: self.address(),
            from_block: to_hex_quantity(range.from_block),
            to_block: to_hex_quantity(range.to_block),
            topics: vec![Some(transfer_topic())],
        };
        let logs = self.provider.get_logs(&filter).await?;
        Ok(decode_transfer_logs(&logs))
    }
}

/// Decode ERC-721 Transfer logs, sorted by (block, log index)
///
/// ERC-20 shares the Transfer signature but keeps the amount in `data`
/// (3 topics); only 4-topic logs are ERC-721 transfers.
pub fn decode_transfer_logs(logs: &[RpcLog]) -> Vec<TransferEvent> {
    let signature = transfer_topic();
    let mut events: Vec<TransferEvent> = logs
        .iter()
        .filter(|log| !log.removed && log.topics.len() == 4)
        .filter(|log| log.topics[0].eq_ignore_ascii_case(&signature))
        .filter_map(|log| {
            Some(TransferEvent {
                block_number: log.block_number.as_deref().and_then(parse_hex_u64)?,
                log_index: log.log_index.as_deref().and_then(parse_hex_u64).unwrap_or(0),
                from: topic_to_address(&log.topics[1])?,
                to: topic_to_address(&log.topics[2])?,
                token_id: topic_to_u256(&log.topics[3])?,
            })
        })
        .collect();
    events.sort_by_key(|e| (e.block_number, e.log_index));
    events
}

/// Keccak topic of Transfer(address,address,uint256)
pub fn transfer_topic() -> String {
    format!("0x{}", hex::encode(Transfer::SIGNATURE_HASH))
}
