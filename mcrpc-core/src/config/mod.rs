//! Configuration types
//!
//! Per-role timeout policy. Firmware may persist it as postcard binary data
//! (`serde` feature).

pub mod types;

pub use types::*;
