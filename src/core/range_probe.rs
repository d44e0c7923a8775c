//! Token-range probe strategy
//!
//! Brute-forces `ownerOf(id)` over `[start, start + bound)`. A revert means
//! the id does not exist. Once a batch past index `sparse_stop_after_batch`
//! finds fewer than `sparse_stop_ratio` of its ids, the collection boundary
//! is assumed passed and the scan stops.

use alloy_primitives::U256;
use futures_util::future::join_all;
use tracing::{debug, info};

use crate::core::aggregator::HolderRegistry;
use crate::core::executor::RequestExecutor;
use crate::core::limiter::ConcurrencyLimiter;
use crate::core::progress::{percent, ProgressReporter};
use crate::models::config::ScanConfig;
use crate::models::errors::{AppError, AppResult};
use crate::providers::contract::NftContract;
use crate::utils::decoder::address_key;

pub async fn probe_token_range<C, R>(
    contract: &C,
    executor: &RequestExecutor,
    config: &ScanConfig,
    reporter: &R,
) -> AppResult<HolderRegistry>
where
    C: NftContract,
    R: ProgressReporter + ?Sized,
{
    let first = config.range_start_token;
    let bound = config.range_max_tokens;
    let last = first.saturating_add(bound);
    let batch_size = config.range_batch_size.max(1) as u64;
    let limiter = ConcurrencyLimiter::new(config.range_concurrency);

    info!("🔎 Probing token ids {}..{} via ownerOf", first, last);
    reporter.report(0, &format!("Checking token ids {}..{}...", first, last));

    let mut registry = HolderRegistry::new();
    let mut batch_index = 0usize;
    let mut start = first;

    while start < last {
        let end = start.saturating_add(batch_size).min(last);

        let probes = (start..end).map(|id| {
            let limiter = &limiter;
            async move {
                let token_id = U256::from(id);
                let result = limiter
                    .run(move || executor.execute("ownerOf", move || contract.owner_of(token_id)))
                    .await;
                (id, result)
            }
        });

        let mut found = 0usize;
        for (id, result) in join_all(probes).await {
            match result {
                Ok(owner) => {
                    registry.upsert(&address_key(&owner), &id.to_string());
                    found += 1;
                }
                Err(e) => debug!("token {} not found: {}", id, e),
            }
        }

        let checked = end - start;
        reporter.report(
            percent(end - first, bound),
            &format!(
                "Checked ids up to {}, {} tokens found so far",
                end - 1,
                registry.total_tokens()
            ),
        );

        if is_sparse(found, checked, batch_index, config) {
            info!(
                "🛑 Sparse batch #{} ({} of {} ids found), stopping at id {}",
                batch_index,
                found,
                checked,
                end - 1
            );
            break;
        }

        batch_index += 1;
        start = end;
    }

    if registry.is_empty() {
        return Err(AppError::strategy_empty(format!(
            "no tokens found among ids {}..{}",
            first, last
        )));
    }

    info!(
        "🔎 Range probe done: {} holders, {} tokens",
        registry.len(),
        registry.total_tokens()
    );
    Ok(registry)
}

/// Density check used for early stop
fn is_sparse(found: usize, checked: u64, batch_index: usize, config: &ScanConfig) -> bool {
    if batch_index <= config.sparse_stop_after_batch || checked == 0 {
        return false;
    }
    (found as f64 / checked as f64) < config.sparse_stop_ratio
}
