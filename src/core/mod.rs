//! Core Module - Holder Discovery Engine
//!
//! Retry executor, concurrency limiter, the three discovery strategies,
//! the aggregator they feed, and the orchestrator that sequences them.

pub mod aggregator;
pub mod enumeration;
pub mod event_scan;
pub mod executor;
pub mod limiter;
pub mod orchestrator;
pub mod prober;
pub mod progress;
pub mod range_probe;

pub use aggregator::*;
pub use enumeration::*;
pub use event_scan::*;
pub use executor::*;
pub use limiter::*;
pub use orchestrator::*;
pub use prober::*;
pub use progress::*;
pub use range_probe::*;
