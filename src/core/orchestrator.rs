//! Strategy orchestrator
//!
//! Runs the discovery strategies in fallback order and keeps the first
//! non-empty registry:
//!
//! 1. collection name / symbol (best effort)
//! 2. enumeration probe
//! 3. enumeration, only when the probe passed
//! 4. token-range probe
//! 5. Transfer-event scan
//!
//! A strategy that errors or finds nothing never aborts the run. Only the
//! exhaustion of all of them is returned to the caller.

use std::time::Instant;
use tracing::{error, info, warn};

use crate::core::aggregator::HolderRegistry;
use crate::core::enumeration::enumerate_holders;
use crate::core::event_scan::scan_transfer_events;
use crate::core::executor::RequestExecutor;
use crate::core::prober::probe_enumeration;
use crate::core::progress::ProgressReporter;
use crate::core::range_probe::probe_token_range;
use crate::models::config::ScanConfig;
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{CollectionInfo, ScanSummary, StrategyKind};
use crate::providers::contract::NftContract;
use crate::utils::constants::{UNKNOWN_COLLECTION_NAME, UNKNOWN_COLLECTION_SYMBOL};

/// What one strategy produced
#[derive(Debug)]
pub enum StrategyOutcome {
    Found(HolderRegistry),
    Empty(AppError),
}

impl StrategyOutcome {
    /// Empty registries count as a miss, same as an error
    pub fn from_result(kind: StrategyKind, result: AppResult<HolderRegistry>) -> Self {
        match result {
            Ok(registry) if !registry.is_empty() => StrategyOutcome::Found(registry),
            Ok(_) => StrategyOutcome::Empty(AppError::strategy_empty(format!(
                "{} found no holders",
                kind
            ))),
            Err(e) => StrategyOutcome::Empty(e),
        }
    }
}

/// Registry plus the summary of how it was obtained
#[derive(Debug)]
pub struct ScanOutcome {
    pub registry: HolderRegistry,
    pub summary: ScanSummary,
}

pub struct HolderScanner<C, R> {
    contract: C,
    config: ScanConfig,
    executor: RequestExecutor,
    reporter: R,
}

impl<C, R> HolderScanner<C, R>
where
    C: NftContract,
    R: ProgressReporter,
{
    pub fn new(contract: C, config: ScanConfig, reporter: R) -> Self {
        let executor = RequestExecutor::from_config(&config);
        Self {
            contract,
            config,
            executor,
            reporter,
        }
    }

    pub fn contract(&self) -> &C {
        &self.contract
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub async fn run(&self) -> AppResult<ScanOutcome> {
        let started = Instant::now();
        self.reporter.report(0, "Fetching collection info...");
        let collection = self.collection_info().await;
        info!(
            "🚀 Scanning holders of {} ({}) at {}",
            collection.name, collection.symbol, collection.address
        );

        let mut attempted = Vec::new();

        self.reporter.report(0, "Checking ERC-721 Enumerable support...");
        let support = probe_enumeration(&self.contract, &self.executor).await;

        let mut order = Vec::with_capacity(3);
        if support.is_supported() {
            order.push(StrategyKind::Enumeration);
        } else {
            info!("ℹ️ Enumerable extension not available, skipping enumeration");
        }
        order.push(StrategyKind::TokenRange);
        order.push(StrategyKind::TransferEvents);

        for kind in order {
            attempted.push(kind);
            match self.attempt(kind).await {
                StrategyOutcome::Found(registry) => {
                    let summary = ScanSummary {
                        collection,
                        total_holders: registry.len(),
                        total_tokens: registry.total_tokens(),
                        strategies_attempted: attempted,
                        strategy_used: kind,
                        elapsed_ms: started.elapsed().as_millis() as u64,
                    };
                    info!("{}", summary.summary());
                    self.reporter.report(
                        100,
                        &format!(
                            "Found {} holders owning {} tokens via {} (tried: {})",
                            summary.total_holders,
                            summary.total_tokens,
                            kind,
                            summary.attempted_labels()
                        ),
                    );
                    return Ok(ScanOutcome { registry, summary });
                }
                StrategyOutcome::Empty(e) => {
                    warn!("⚠️ {} gave no holders: {}", kind, e);
                }
            }
        }

        let err = AppError::strategies_exhausted();
        error!("❌ {} ({}ms)", err, started.elapsed().as_millis());
        self.reporter.report(100, &err.message);
        Err(err)
    }

    async fn attempt(&self, kind: StrategyKind) -> StrategyOutcome {
        info!("▶️ Trying {}", kind);
        self.reporter.report(0, &format!("Trying {}...", kind));

        let result = match kind {
            StrategyKind::Enumeration => {
                enumerate_holders(&self.contract, &self.executor, &self.config, &self.reporter)
                    .await
            }
            StrategyKind::TokenRange => {
                probe_token_range(&self.contract, &self.executor, &self.config, &self.reporter)
                    .await
            }
            StrategyKind::TransferEvents => {
                scan_transfer_events(&self.contract, &self.executor, &self.config, &self.reporter)
                    .await
            }
        };
        StrategyOutcome::from_result(kind, result)
    }

    /// Name and symbol, falling back to placeholders
    async fn collection_info(&self) -> CollectionInfo {
        let name = self
            .executor
            .execute("name", || self.contract.name())
            .await
            .unwrap_or_else(|_| UNKNOWN_COLLECTION_NAME.to_string());
        let symbol = self
            .executor
            .execute("symbol", || self.contract.symbol())
            .await
            .unwrap_or_else(|_| UNKNOWN_COLLECTION_SYMBOL.to_string());

        CollectionInfo {
            address: self.contract.address(),
            name,
            symbol,
        }
    }
}
