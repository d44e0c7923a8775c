//! Hex / address helpers shared by the RPC layer and the aggregator

use alloy_primitives::{Address, B256, U256};
use std::str::FromStr;

/// Canonical registry key for an address: lowercase, 0x-prefixed
#[inline]
pub fn address_key(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}

/// Normalize a provider-returned address string to the registry key form
#[inline]
pub fn normalize_address(address: &str) -> String {
    let trimmed = address.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    format!("0x{}", body.to_lowercase())
}

/// Parse a contract address from user input
pub fn parse_address(raw: &str) -> Option<Address> {
    Address::from_str(raw.trim()).ok()
}

/// Parse a JSON-RPC quantity ("0x1a") into u64
pub fn parse_hex_u64(raw: &str) -> Option<u64> {
    let body = raw.trim().strip_prefix("0x").unwrap_or(raw.trim());
    if body.is_empty() {
        return None;
    }
    u64::from_str_radix(body, 16).ok()
}

/// Format u64 as a JSON-RPC quantity
pub fn to_hex_quantity(value: u64) -> String {
    format!("0x{:x}", value)
}

/// Indexed address topic (32 bytes) -> registry key
pub fn topic_to_address(topic: &str) -> Option<String> {
    let word = B256::from_str(topic).ok()?;
    Some(address_key(&Address::from_word(word)))
}

/// Indexed uint256 topic -> U256
pub fn topic_to_u256(topic: &str) -> Option<U256> {
    let word = B256::from_str(topic).ok()?;
    Some(U256::from_be_slice(word.as_slice()))
}
