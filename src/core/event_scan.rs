//! Transfer-event scan strategy
//!
//! Replays ERC-721 `Transfer` logs over a bounded window behind head and
//! keeps the last recipient of each token. Tokens whose last transfer is
//! older than the window are not seen; set `event_lookback_blocks = None`
//! to scan from `event_from_block` instead.
//!
//! Chunks are fetched `event_concurrency` at a time but applied strictly in
//! ascending chunk order, so last-write-wins sees events in block order.

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::core::aggregator::{HolderRegistry, TokenOwnerMap};
use crate::core::executor::RequestExecutor;
use crate::core::limiter::ConcurrencyLimiter;
use crate::core::progress::{percent, ProgressReporter};
use crate::models::config::ScanConfig;
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{BlockRange, TransferEvent};
use crate::providers::contract::NftContract;

/// Logs for one chunk plus how much of it was lost
#[derive(Debug, Default)]
struct ChunkLogs {
    events: Vec<TransferEvent>,
    skipped_ranges: usize,
    requests: usize,
}

pub async fn scan_transfer_events<C, R>(
    contract: &C,
    executor: &RequestExecutor,
    config: &ScanConfig,
    reporter: &R,
) -> AppResult<HolderRegistry>
where
    C: NftContract,
    R: ProgressReporter + ?Sized,
{
    let head = executor.execute("eth_blockNumber", || contract.block_number()).await?;
    let window = scan_window(head, config);
    let chunks = window.chunks(config.event_chunk_blocks);
    let total_chunks = chunks.len() as u64;

    info!(
        "📜 Scanning Transfer logs in blocks {} ({} chunks of {})",
        window, total_chunks, config.event_chunk_blocks
    );
    reporter.report(0, &format!("Scanning Transfer events in blocks {}...", window));

    let limiter = ConcurrencyLimiter::new(config.event_concurrency);
    let mut owners = TokenOwnerMap::new();
    let mut skipped = 0usize;
    let mut requests = 0usize;
    let mut done = 0u64;

    for group in chunks.chunks(limiter.max_concurrent()) {
        let fetches = group.iter().map(|chunk| {
            let limiter = &limiter;
            async move {
                let min_bisect = config.min_bisect_blocks;
                limiter
                    .run(move || async move {
                        Ok::<_, AppError>(fetch_chunk(contract, executor, *chunk, min_bisect).await)
                    })
                    .await
            }
        });

        // join_all keeps chunk order regardless of completion order
        for (chunk, result) in group.iter().zip(join_all(fetches).await) {
            match result {
                Ok(logs) => {
                    debug!("chunk {}: {} transfers", chunk, logs.events.len());
                    owners.apply_all(&logs.events);
                    skipped += logs.skipped_ranges;
                    requests += logs.requests;
                }
                Err(e) => {
                    warn!("⚠️ Skipping blocks {}: {}", chunk, e);
                    skipped += 1;
                }
            }
            done += 1;
        }

        reporter.report(
            percent(done, total_chunks),
            &format!(
                "Scanned {}/{} block chunks, {} tokens tracked",
                done,
                total_chunks,
                owners.len()
            ),
        );
    }

    let events = owners.events_applied();
    let registry = owners.into_registry();
    if skipped > 0 {
        warn!("⚠️ {} block ranges could not be fetched; holder list may be incomplete", skipped);
    }
    info!(
        "📜 Event scan done: {} transfers over {} requests → {} holders, {} tokens",
        events,
        requests,
        registry.len(),
        registry.total_tokens()
    );

    if registry.is_empty() {
        return Err(AppError::strategy_empty(format!(
            "no current holders found from Transfer events in blocks {}",
            window
        )));
    }
    Ok(registry)
}

/// Block window to scan for a given head: the last `lookback` blocks up to head
pub fn scan_window(head: u64, config: &ScanConfig) -> BlockRange {
    let from = match config.event_lookback_blocks {
        Some(lookback) => head.saturating_sub(lookback.saturating_sub(1)),
        None => config.event_from_block.min(head),
    };
    BlockRange::new(from, head)
}

/// Fetch one chunk, bisecting on oversized responses.
///
/// Halves are processed lowest-first so the returned events stay in block
/// order. Ranges at or below `min_bisect_blocks`, and failures that are not
/// size related, are skipped.
async fn fetch_chunk<C: NftContract>(
    contract: &C,
    executor: &RequestExecutor,
    chunk: BlockRange,
    min_bisect_blocks: u64,
) -> ChunkLogs {
    let mut out = ChunkLogs::default();
    let mut pending = vec![chunk];

    while let Some(range) = pending.pop() {
        out.requests += 1;
        match executor
            .execute("eth_getLogs", || contract.transfer_logs(range))
            .await
        {
            Ok(events) => out.events.extend(events),
            Err(e) if e.triggers_bisection() && range.len() > min_bisect_blocks => {
                match range.split() {
                    Some((low, high)) => {
                        debug!("✂️ Splitting {} into {} and {}: {}", range, low, high, e);
                        pending.push(high);
                        pending.push(low);
                    }
                    None => {
                        warn!("⚠️ Skipping blocks {}: {}", range, e);
                        out.skipped_ranges += 1;
                    }
                }
            }
            Err(e) => {
                warn!("⚠️ Skipping blocks {}: {}", range, e);
                out.skipped_ranges += 1;
            }
        }
    }

    out.events.sort_by_key(|e| (e.block_number, e.log_index));
    out
}
