//! Scanner configuration
//!
//! Defaults come from `utils::constants`; any of them can be overridden
//! through `HOLDERS_*` environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::utils::constants::{
    DEFAULT_EXPORT_DIR, DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_RETRIES, DEFAULT_RPC_TIMEOUT_SECS,
    DEFAULT_RPC_URL, ENUMERATION_BATCH_SIZE, ENUMERATION_CONCURRENCY, ENUMERATION_MAX_SUPPLY,
    EVENT_CHUNK_BLOCKS, EVENT_CONCURRENCY, EVENT_LOOKBACK_BLOCKS, MIN_BISECT_BLOCKS,
    RANGE_BATCH_SIZE, RANGE_CONCURRENCY, RANGE_MAX_TOKENS, SPARSE_STOP_AFTER_BATCH, SPARSE_STOP_RATIO,
};

/// Configuration for a holder scan
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// JSON-RPC endpoint
    pub rpc_url: String,
    /// Per-request timeout, independent of the retry budget
    pub request_timeout: Duration,
    /// Attempts per remote call
    pub max_retries: u32,
    /// Backoff before the first retry (doubles each time)
    pub initial_backoff_ms: u64,

    /// Indices per enumeration batch
    pub enumeration_batch_size: usize,
    /// Concurrent tokenByIndex/ownerOf lookups
    pub enumeration_concurrency: usize,
    /// Largest totalSupply the enumeration walk accepts
    pub enumeration_max_supply: u64,

    /// Token ids per range-probe batch
    pub range_batch_size: usize,
    /// Concurrent ownerOf probes
    pub range_concurrency: usize,
    /// First candidate token id
    pub range_start_token: u64,
    /// Number of candidate token ids
    pub range_max_tokens: u64,
    /// Per-batch hit rate below which the probe stops
    pub sparse_stop_ratio: f64,
    /// Sparse stop is only checked for batch indices above this
    pub sparse_stop_after_batch: usize,

    /// Blocks per log query
    pub event_chunk_blocks: u64,
    /// Log queries in flight
    pub event_concurrency: usize,
    /// Blocks behind head to scan; `None` scans from `event_from_block`
    pub event_lookback_blocks: Option<u64>,
    /// First block for full-history scans
    pub event_from_block: u64,
    /// Bisection floor for oversized log queries
    pub min_bisect_blocks: u64,

    /// Output directory for exports
    pub export_dir: PathBuf,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_RPC_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            enumeration_batch_size: ENUMERATION_BATCH_SIZE,
            enumeration_concurrency: ENUMERATION_CONCURRENCY,
            enumeration_max_supply: ENUMERATION_MAX_SUPPLY,
            range_batch_size: RANGE_BATCH_SIZE,
            range_concurrency: RANGE_CONCURRENCY,
            range_start_token: 0,
            range_max_tokens: RANGE_MAX_TOKENS,
            sparse_stop_ratio: SPARSE_STOP_RATIO,
            sparse_stop_after_batch: SPARSE_STOP_AFTER_BATCH,
            event_chunk_blocks: EVENT_CHUNK_BLOCKS,
            event_concurrency: EVENT_CONCURRENCY,
            event_lookback_blocks: Some(EVENT_LOOKBACK_BLOCKS),
            event_from_block: 0,
            min_bisect_blocks: MIN_BISECT_BLOCKS,
            export_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
        }
    }
}

impl ScanConfig {
    /// Build config from the environment on top of the defaults
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `HOLDERS_RPC_URL` (or `ETH_HTTP_URL`) | `rpc_url` |
    /// | `HOLDERS_TIMEOUT_SECS` | `request_timeout` |
    /// | `HOLDERS_MAX_RETRIES` | `max_retries` |
    /// | `HOLDERS_BACKOFF_MS` | `initial_backoff_ms` |
    /// | `HOLDERS_MAX_SUPPLY` | `enumeration_max_supply` |
    /// | `HOLDERS_MAX_TOKENS` | `range_max_tokens` |
    /// | `HOLDERS_START_TOKEN` | `range_start_token` |
    /// | `HOLDERS_LOOKBACK_BLOCKS` (`full` = whole history) | `event_lookback_blocks` |
    /// | `HOLDERS_FROM_BLOCK` | `event_from_block` |
    /// | `HOLDERS_EXPORT_DIR` | `export_dir` |
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(url) = env_string("HOLDERS_RPC_URL").or_else(|| env_string("ETH_HTTP_URL")) {
            config.rpc_url = url;
        } else {
            info!("🌐 No HOLDERS_RPC_URL set, using public RPC {}", DEFAULT_RPC_URL);
        }
        if let Some(secs) = env_parse::<u64>("HOLDERS_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = env_parse("HOLDERS_MAX_RETRIES")? {
            config.max_retries = retries;
        }
        if let Some(ms) = env_parse("HOLDERS_BACKOFF_MS")? {
            config.initial_backoff_ms = ms;
        }
        if let Some(max) = env_parse("HOLDERS_MAX_SUPPLY")? {
            config.enumeration_max_supply = max;
        }
        if let Some(max) = env_parse("HOLDERS_MAX_TOKENS")? {
            config.range_max_tokens = max;
        }
        if let Some(start) = env_parse("HOLDERS_START_TOKEN")? {
            config.range_start_token = start;
        }
        if let Some(lookback) = env_string("HOLDERS_LOOKBACK_BLOCKS") {
            config.event_lookback_blocks = parse_lookback(&lookback)?;
        }
        if let Some(from) = env_parse("HOLDERS_FROM_BLOCK")? {
            config.event_from_block = from;
        }
        if let Some(dir) = env_string("HOLDERS_EXPORT_DIR") {
            config.export_dir = PathBuf::from(dir);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall or break a scan
    pub fn validate(&self) -> AppResult<()> {
        if self.rpc_url.trim().is_empty() {
            return Err(AppError::new(ErrorCode::ConfigMissingEnv, "RPC URL is empty"));
        }
        if self.max_retries == 0 {
            return Err(AppError::invalid_config("max_retries must be at least 1"));
        }
        let sizes = [
            ("enumeration_batch_size", self.enumeration_batch_size),
            ("enumeration_concurrency", self.enumeration_concurrency),
            ("range_batch_size", self.range_batch_size),
            ("range_concurrency", self.range_concurrency),
            ("event_concurrency", self.event_concurrency),
        ];
        for (name, value) in sizes {
            if value == 0 {
                return Err(AppError::invalid_config(format!("{} must be greater than 0", name)));
            }
        }
        if self.enumeration_max_supply == 0 {
            return Err(AppError::invalid_config("enumeration_max_supply must be greater than 0"));
        }
        if self.event_chunk_blocks == 0 {
            return Err(AppError::invalid_config("event_chunk_blocks must be greater than 0"));
        }
        if self.min_bisect_blocks == 0 {
            return Err(AppError::invalid_config("min_bisect_blocks must be greater than 0"));
        }
        if !(0.0..=1.0).contains(&self.sparse_stop_ratio) {
            return Err(AppError::invalid_config(format!(
                "sparse_stop_ratio must be within 0..=1, got {}",
                self.sparse_stop_ratio
            )));
        }
        Ok(())
    }
}

/// `full`, `all` or `0` mean "scan the whole history"
fn parse_lookback(raw: &str) -> AppResult<Option<u64>> {
    match raw.trim().to_lowercase().as_str() {
        "full" | "all" | "0" => Ok(None),
        other => other.parse::<u64>().map(Some).map_err(|_| {
            AppError::invalid_config(format!("HOLDERS_LOOKBACK_BLOCKS: invalid value '{}'", raw))
        }),
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> AppResult<Option<T>> {
    match env_string(key) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::invalid_config(format!("{}: invalid value '{}'", key, raw))),
        None => Ok(None),
    }
}
