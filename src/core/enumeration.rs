//! Enumeration batch strategy (ERC-721 Enumerable)
//!
//! Walks `tokenByIndex(i)` → `ownerOf(id)` for every index below
//! `totalSupply()`, in sequential batches with bounded fan-out inside each.

use alloy_primitives::U256;
use futures_util::future::join_all;
use tracing::{debug, info};

use crate::core::aggregator::HolderRegistry;
use crate::core::executor::RequestExecutor;
use crate::core::limiter::ConcurrencyLimiter;
use crate::core::progress::{percent, ProgressReporter};
use crate::models::config::ScanConfig;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::providers::contract::NftContract;
use crate::utils::decoder::address_key;

pub async fn enumerate_holders<C, R>(
    contract: &C,
    executor: &RequestExecutor,
    config: &ScanConfig,
    reporter: &R,
) -> AppResult<HolderRegistry>
where
    C: NftContract,
    R: ProgressReporter + ?Sized,
{
    let supply = executor.execute("totalSupply", || contract.total_supply()).await?;
    if supply.is_zero() {
        return Err(AppError::new(ErrorCode::NoTokens, "no tokens in collection"));
    }
    let total = match u64::try_from(supply) {
        Ok(total) if total <= config.enumeration_max_supply => total,
        _ => {
            return Err(AppError::strategy_empty(format!(
                "implausible totalSupply {} (limit {})",
                supply, config.enumeration_max_supply
            )))
        }
    };
    info!("🔢 Enumerating {} tokens", total);
    reporter.report(0, &format!("Enumerating {} tokens...", total));

    let limiter = ConcurrencyLimiter::new(config.enumeration_concurrency);
    let batch_size = config.enumeration_batch_size.max(1) as u64;
    let mut registry = HolderRegistry::new();
    let mut not_found = 0u64;

    let mut start = 0u64;
    while start < total {
        let end = start.saturating_add(batch_size).min(total);

        let lookups = (start..end).map(|index| {
            let limiter = &limiter;
            async move {
                let result = limiter
                    .run(move || lookup_index(contract, executor, index))
                    .await;
                (index, result)
            }
        });

        // join_all keeps submission order, so the fold below is by index
        for (index, result) in join_all(lookups).await {
            match result {
                Ok((token_id, owner)) => {
                    registry.upsert(&owner, &token_id.to_string());
                }
                Err(e) => {
                    not_found += 1;
                    debug!("index {} not found: {}", index, e);
                }
            }
        }

        reporter.report(
            percent(end, total),
            &format!("Enumerated {}/{} tokens, {} holders so far", end, total, registry.len()),
        );
        start = end;
    }

    info!(
        "🔢 Enumeration done: {} holders, {} tokens, {} misses",
        registry.len(),
        registry.total_tokens(),
        not_found
    );
    Ok(registry)
}

async fn lookup_index<C: NftContract>(
    contract: &C,
    executor: &RequestExecutor,
    index: u64,
) -> AppResult<(U256, String)> {
    let token_id = executor
        .execute("tokenByIndex", || contract.token_by_index(U256::from(index)))
        .await?;
    let owner = executor.execute("ownerOf", || contract.owner_of(token_id)).await?;
    Ok((token_id, address_key(&owner)))
}
