//! Constants Module - Single Source of Truth
//!
//! Every tuning knob used by the scanner has its default here.
//! `ScanConfig` reads these and lets the environment override them.

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "RusterHolders";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for HTTP requests
pub const USER_AGENT: &str = "RusterHolders/0.1.0";

/// Public RPC used when nothing is configured
pub const DEFAULT_RPC_URL: &str = "https://eth.llamarpc.com";

// ============================================
// RPC CONSTANTS
// ============================================

/// Timeout for a single RPC request (seconds)
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;

/// Attempts per call before the error is surfaced
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// First backoff delay; doubles on every retry (1s -> 2s -> 4s ...)
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 1000;

// ============================================
// ENUMERATION STRATEGY
// ============================================

/// Indices per batch for tokenByIndex walks
pub const ENUMERATION_BATCH_SIZE: usize = 50;

/// In-flight lookups per enumeration batch
pub const ENUMERATION_CONCURRENCY: usize = 10;

/// totalSupply above this is treated as bogus and enumeration is skipped
pub const ENUMERATION_MAX_SUPPLY: u64 = 10_000_000;

// ============================================
// TOKEN RANGE PROBE STRATEGY
// ============================================

/// Token ids checked per batch
pub const RANGE_BATCH_SIZE: usize = 200;

/// In-flight ownerOf calls per batch
pub const RANGE_CONCURRENCY: usize = 20;

/// Upper bound on candidate token ids
pub const RANGE_MAX_TOKENS: u64 = 10_000;

/// Batches with a hit rate under this fraction stop the probe
pub const SPARSE_STOP_RATIO: f64 = 0.01;

/// Sparse stop only applies to batch indices greater than this
pub const SPARSE_STOP_AFTER_BATCH: usize = 3;

// ============================================
// TRANSFER EVENT SCAN STRATEGY
// ============================================

/// Blocks per eth_getLogs chunk
pub const EVENT_CHUNK_BLOCKS: u64 = 5_000;

/// Chunks fetched at the same time
pub const EVENT_CONCURRENCY: usize = 3;

/// How far behind head the scan starts
pub const EVENT_LOOKBACK_BLOCKS: u64 = 50_000;

/// Ranges this small are not bisected any further
pub const MIN_BISECT_BLOCKS: u64 = 64;

// ============================================
// OUTPUT
// ============================================

/// Where CSV / JSON exports land
pub const DEFAULT_EXPORT_DIR: &str = "./exports";

/// Name used when name() is not available
pub const UNKNOWN_COLLECTION_NAME: &str = "Unknown Collection";

/// Symbol used when symbol() is not available
pub const UNKNOWN_COLLECTION_SYMBOL: &str = "UNKNOWN";
