//! Utils Module - Helper Functions & Shared Utilities
//!
//! Constants, hex/address decoding and file export.

pub mod constants;
pub mod decoder;
pub mod export;

pub use constants::*;
pub use decoder::*;
pub use export::*;
