//! Providers Module - External Data Sources
//!
//! JSON-RPC transport and the ERC-721 contract binding built on it.

pub mod contract;
pub mod rpc;

pub use contract::*;
pub use rpc::*;
