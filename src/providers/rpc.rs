//! RPC Client Module - plain JSON-RPC over HTTP
//!
//! - User-Agent header & API key masking in logs
//! - Gzip compression for large eth_getLogs responses
//! - Per-request timeout (the retry budget lives in `core::executor`)
//! - Node errors classified into the `ErrorCode` taxonomy

use alloy_primitives::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::utils::constants::USER_AGENT as USER_AGENT_CONST;
use crate::utils::decoder::parse_hex_u64;

/// eth_getLogs filter
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilter {
    pub address: String,
    pub from_block: String,
    pub to_block: String,
    pub topics: Vec<Option<String>>,
}

/// Raw log entry as returned by eth_getLogs
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcLog {
    pub address: String,
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
    pub block_number: Option<String>,
    pub log_index: Option<String>,
    #[serde(default)]
    pub removed: bool,
}

/// Plain JSON-RPC provider (one endpoint, one attempt per call)
#[derive(Clone)]
pub struct RpcProvider {
    /// Endpoint URL (may embed an API key)
    url: String,
    /// HTTP client with custom headers (gzip enabled)
    client: reqwest::Client,
    /// JSON-RPC request id counter
    next_id: Arc<AtomicU64>,
}

impl RpcProvider {
    /// Create a provider for `url` with a per-request timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(AppError::new(ErrorCode::ConfigMissingEnv, "RPC URL is empty"));
        }

        Ok(Self {
            url,
            client: Self::build_client(timeout)?,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    /// Build HTTP client with custom headers
    fn build_client(timeout: Duration) -> AppResult<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| AppError::with_source(ErrorCode::Unknown, "Failed to build HTTP client", e))
    }

    /// Execute a single JSON-RPC call
    pub async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> AppResult<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id
        });

        let response = self.client.post(&self.url).json(&payload).send().await?;

        let status = response.status();
        if status == 429 {
            warn!("⏳ Rate limited (HTTP 429) on {}", method);
            return Err(AppError::rpc_rate_limited());
        }
        if status == 413 {
            return Err(AppError::query_too_large(format!("{}: payload too large (HTTP 413)", method)));
        }
        if !status.is_success() {
            return Err(AppError::new(ErrorCode::RpcError, format!("HTTP error: {}", status)));
        }

        let body = response.bytes().await?;
        let json: RpcResponse<T> = serde_json::from_slice(&body).map_err(|e| {
            AppError::with_source(
                ErrorCode::RpcInvalidResponse,
                format!("{}: failed to parse response ({} bytes)", method, body.len()),
                e,
            )
        })?;

        if let Some(error) = json.error {
            let code = error.classify();
            debug!("RPC error on {}: {} (code: {}) -> {}", method, error.message, error.code, code.as_str());
            return Err(AppError::new(
                code,
                format!("RPC error: {} (code: {})", error.message, error.code),
            ));
        }

        json.result
            .ok_or_else(|| AppError::new(ErrorCode::RpcInvalidResponse, "No result in response"))
    }

    /// Execute eth_call against latest state
    pub async fn eth_call(&self, to: &str, data: &[u8]) -> AppResult<Bytes> {
        let params = serde_json::json!([
            { "to": to, "data": format!("0x{}", hex::encode(data)) },
            "latest"
        ]);
        let raw: String = self.call("eth_call", params).await?;
        Bytes::from_str(&raw).map_err(|e| {
            AppError::new(ErrorCode::RpcInvalidResponse, format!("eth_call returned bad hex: {}", e))
        })
    }

    /// Current chain head
    pub async fn block_number(&self) -> AppResult<u64> {
        let raw: String = self.call("eth_blockNumber", serde_json::json!([])).await?;
        parse_hex_u64(&raw).ok_or_else(|| {
            AppError::new(ErrorCode::RpcInvalidResponse, format!("Bad block number: {}", raw))
        })
    }

    /// eth_getLogs
    pub async fn get_logs(&self, filter: &LogFilter) -> AppResult<Vec<RpcLog>> {
        self.call("eth_getLogs", serde_json::json!([filter])).await
    }

    /// Get RPC URL (masked for logging)
    pub fn masked_url(&self) -> String {
        if self.url.contains("/v2/") {
            let parts: Vec<&str> = self.url.split("/v2/").collect();
            if parts.len() == 2 {
                return format!("{}/v2/***HIDDEN***", parts[0]);
            }
        }
        self.url.clone()
    }
}

/// JSON-RPC response structure
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

/// JSON-RPC error structure
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    /// Check if this is a rate limit error (HTTP 429-like or "rate limit" text)
    pub fn is_rate_limit(&self) -> bool {
        let msg = self.message.to_lowercase();
        self.code == 429
            || msg.contains("rate limit")
            || msg.contains("too many requests")
            || msg.contains("compute units")
            || msg.contains("capacity")
            || msg.contains("throttl")
    }

    /// eth_call reverted (code 3, or -32000 "execution reverted")
    pub fn is_revert(&self) -> bool {
        let msg = self.message.to_lowercase();
        self.code == 3 || msg.contains("revert") || msg.contains("invalid token")
    }

    /// Provider refused a log query because of its size
    pub fn is_oversized(&self) -> bool {
        let msg = self.message.to_lowercase();
        msg.contains("block range")
            || msg.contains("response size")
            || msg.contains("too large")
            || (msg.contains("more than") && msg.contains("result"))
    }

    /// Check if this is a parse error (code -32700)
    pub fn is_parse_error(&self) -> bool {
        self.code == -32700
    }

    /// Map the node error to the error taxonomy
    pub fn classify(&self) -> ErrorCode {
        if self.is_rate_limit() {
            ErrorCode::RpcRateLimited
        } else if self.is_revert() {
            ErrorCode::CallReverted
        } else if self.is_oversized() || self.is_parse_error() {
            ErrorCode::QueryTooLarge
        } else {
            ErrorCode::RpcError
        }
    }
}
