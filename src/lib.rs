//! Ruster Holders Library
//!
//! ERC-721 holder discovery over plain JSON-RPC. Three strategies are tried
//! in order until one yields holders:
//! - ERC-721 Enumerable walk (`totalSupply` / `tokenByIndex` / `ownerOf`)
//! - brute-force `ownerOf` over a bounded token id range
//! - replay of `Transfer` logs over a block window
//!
//! Every remote call goes through a retrying executor with exponential
//! backoff, and fan-out is bounded per strategy.

pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::{
    ChannelReporter, ConcurrencyLimiter, EnumerationSupport, HolderRegistry, HolderScanner,
    ProgressReporter, RequestExecutor, RetryPolicy, ScanOutcome, StrategyOutcome, TokenOwnerMap,
    TracingReporter,
};
pub use models::{
    AppError, AppResult, BlockRange, CollectionInfo, ErrorCode, HolderData, ProgressState,
    ScanConfig, ScanSummary, StrategyKind, TransferEvent,
};
pub use providers::{NftContract, RpcNftContract, RpcProvider};
pub use utils::{ExportedFiles, HolderExporter};
