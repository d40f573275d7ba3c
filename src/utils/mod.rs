//! Utility modules

pub mod encoding;
pub mod memory_cache;

pub use encoding::*;
pub use memory_cache::*;
