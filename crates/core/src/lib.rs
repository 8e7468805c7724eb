//! Ticker Info Core - attribute lookups, cache contract and orchestration.
//!
//! This crate decides when the cache can answer, when the resolution engine
//! has to run and what gets written back. It is storage-agnostic and defines
//! the [`AttributeCacheStore`] trait implemented by the `storage-file` crate.

pub mod attributes;
pub mod constants;
pub mod errors;

// Re-export common types from the attributes module
pub use attributes::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
