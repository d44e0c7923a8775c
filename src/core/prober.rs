//! Capability probe for the ERC-721 Enumerable extension
//!
//! totalSupply() → tokenByIndex(0) → ownerOf(id). Any failure means "not
//! enumerable". A heuristic: false negatives are accepted.

use alloy_primitives::U256;
use tracing::{debug, info};

use crate::core::executor::RequestExecutor;
use crate::providers::contract::NftContract;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumerationSupport {
    Supported,
    Unsupported,
}

impl EnumerationSupport {
    pub fn is_supported(&self) -> bool {
        matches!(self, EnumerationSupport::Supported)
    }
}

pub async fn probe_enumeration<C: NftContract>(
    contract: &C,
    executor: &RequestExecutor,
) -> EnumerationSupport {
    let supply = executor.execute("totalSupply", || contract.total_supply()).await;
    if let Err(e) = supply {
        debug!("totalSupply() unavailable: {}", e);
        return EnumerationSupport::Unsupported;
    }

    let first = match executor
        .execute("tokenByIndex(0)", || contract.token_by_index(U256::ZERO))
        .await
    {
        Ok(id) => id,
        Err(e) => {
            debug!("tokenByIndex(0) unavailable: {}", e);
            return EnumerationSupport::Unsupported;
        }
    };

    match executor.execute("ownerOf", || contract.owner_of(first)).await {
        Ok(_) => {
            info!("🔢 Contract supports ERC-721 Enumerable");
            EnumerationSupport::Supported
        }
        Err(e) => {
            debug!("ownerOf({}) failed during probe: {}", first, e);
            EnumerationSupport::Unsupported
        }
    }
}
