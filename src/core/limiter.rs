//! Concurrency limiter
//!
//! Caps the number of in-flight remote calls for a strategy. Tasks are
//! futures awaited on the caller's task; fan-out happens with
//! `join_all`, so no thread is spawned.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::models::errors::{AppError, AppResult, ErrorCode};

#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
}

impl ConcurrencyLimiter {
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Tasks currently holding a permit
    pub fn in_flight(&self) -> usize {
        self.max_concurrent - self.semaphore.available_permits()
    }

    /// Wait for a free slot, then run `task` to completion
    pub async fn run<T, F, Fut>(&self, task: F) -> AppResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| AppError::new(ErrorCode::Unknown, "concurrency limiter closed"))?;
        task().await
    }
}
