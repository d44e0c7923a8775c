//! Centralized Error Handling Module
//!
//! Every failure carries a unique error code so logs stay greppable.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - RPC_xxx: transport / node errors
//! - CALL_xxx: contract call outcomes
//! - SCAN_xxx: strategy-level outcomes
//! - CFG_xxx: Configuration errors

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    /// Should the request executor try this call again?
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    /// Should an event-log query be split into smaller block ranges?
    pub fn triggers_bisection(&self) -> bool {
        self.code.triggers_bisection()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // RPC Errors (transient)
    // ============================================
    /// RPC connection failed
    RpcConnectionFailed,
    /// RPC request timeout
    RpcTimeout,
    /// RPC rate limited (HTTP 429)
    RpcRateLimited,
    /// RPC returned a generic error response
    RpcError,
    /// Response body could not be parsed
    RpcInvalidResponse,

    // ============================================
    // Contract call outcomes
    // ============================================
    /// Call reverted (nonexistent token, index out of range, ...)
    CallReverted,
    /// Log query exceeded provider limits
    QueryTooLarge,

    // ============================================
    // Scan outcomes
    // ============================================
    /// totalSupply() == 0
    NoTokens,
    /// A strategy finished without finding any holder
    StrategyEmpty,
    /// All discovery strategies came back empty
    StrategiesExhausted,

    // ============================================
    // Configuration Errors
    // ============================================
    /// Missing environment variable
    ConfigMissingEnv,
    /// Invalid configuration value
    ConfigInvalidValue,
    /// Invalid contract address
    InvalidAddress,

    // ============================================
    // Output
    // ============================================
    /// Writing export files failed
    ExportFailed,

    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RpcConnectionFailed => "RPC_CONNECTION_FAILED",
            Self::RpcTimeout => "RPC_TIMEOUT",
            Self::RpcRateLimited => "RPC_RATE_LIMITED",
            Self::RpcError => "RPC_ERROR",
            Self::RpcInvalidResponse => "RPC_INVALID_RESPONSE",

            Self::CallReverted => "CALL_REVERTED",
            Self::QueryTooLarge => "CALL_QUERY_TOO_LARGE",

            Self::NoTokens => "SCAN_NO_TOKENS",
            Self::StrategyEmpty => "SCAN_STRATEGY_EMPTY",
            Self::StrategiesExhausted => "SCAN_STRATEGIES_EXHAUSTED",

            Self::ConfigMissingEnv => "CFG_MISSING_ENV",
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",
            Self::InvalidAddress => "CFG_INVALID_ADDRESS",

            Self::ExportFailed => "EXPORT_FAILED",

            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RpcConnectionFailed
                | Self::RpcTimeout
                | Self::RpcRateLimited
                | Self::RpcError
                | Self::RpcInvalidResponse
        )
    }

    /// Oversized or unparseable log responses are answered with a smaller range
    pub fn triggers_bisection(&self) -> bool {
        matches!(self, Self::QueryTooLarge | Self::RpcInvalidResponse)
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// RPC connection failed
    pub fn rpc_connection_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RpcConnectionFailed, msg)
    }

    /// RPC timeout
    pub fn rpc_timeout(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RpcTimeout, msg)
    }

    /// RPC rate limited
    pub fn rpc_rate_limited() -> Self {
        Self::new(ErrorCode::RpcRateLimited, "Rate limited (HTTP 429)")
    }

    /// Contract call reverted
    pub fn reverted(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::CallReverted, msg)
    }

    /// Log query too large for the provider
    pub fn query_too_large(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::QueryTooLarge, msg)
    }

    /// Invalid contract address
    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAddress, msg)
    }

    /// Invalid configuration value
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalidValue, msg)
    }

    /// Strategy came back empty
    pub fn strategy_empty(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::StrategyEmpty, msg)
    }

    /// Terminal failure after every strategy was tried
    pub fn strategies_exhausted() -> Self {
        Self::new(
            ErrorCode::StrategiesExhausted,
            "Could not find any token holders. The contract may not be a standard ERC-721, \
             or the RPC endpoint may be rate-limiting requests. Try again later or use a \
             different RPC endpoint.",
        )
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorCode::ExportFailed, format!("IO error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ErrorCode::RpcTimeout, "Request timeout")
        } else if err.is_connect() {
            Self::new(ErrorCode::RpcConnectionFailed, "Connection failed")
        } else if err.is_decode() {
            Self::new(ErrorCode::RpcInvalidResponse, format!("Failed to parse response: {}", err))
        } else {
            Self::new(ErrorCode::RpcError, err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::RpcInvalidResponse, "JSON parse error", err)
    }
}
