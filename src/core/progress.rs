//! Push-only progress reporting
//!
//! The engine calls into a `ProgressReporter`; it never reads anything back.

use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

use crate::models::types::ProgressState;

pub trait ProgressReporter {
    /// `percent` is clamped to 0..=100 by the engine
    fn report(&self, percent: u8, message: &str);
}

impl<F> ProgressReporter for F
where
    F: Fn(u8, &str),
{
    fn report(&self, percent: u8, message: &str) {
        self(percent, message)
    }
}

/// Writes progress to the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, percent: u8, message: &str) {
        info!("📈 [{:>3}%] {}", percent, message);
    }
}

/// Forwards progress over a channel (for UIs on another task)
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: UnboundedSender<ProgressState>,
}

impl ChannelReporter {
    pub fn new(tx: UnboundedSender<ProgressState>) -> Self {
        Self { tx }
    }
}

impl ProgressReporter for ChannelReporter {
    fn report(&self, percent: u8, message: &str) {
        // Receiver gone means nobody is watching; the scan carries on
        let _ = self.tx.send(ProgressState {
            percent,
            message: message.to_string(),
        });
    }
}

/// `done / total` as a 0..=100 percentage
pub fn percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) as f64 / total as f64) * 100.0).round() as u8
}
