//! File storage implementation for Ticker Info.
//!
//! This crate implements the cache trait defined in `tickerinfo-core` with
//! one JSON-lines file per asset class:
//!
//! ```text
//!            core (AttributeCacheStore)
//!                       │
//!                       ▼
//!        storage-file (FileCacheRepository)
//!                       │
//!          ┌────────────┼────────────┐
//!          ▼            ▼            ▼
//!   acao_cache.jsonl fii_cache.jsonl ...
//! ```

pub mod cache;

pub use cache::{CacheEntry, FileCacheRepository, FileCacheStore};

// Re-export from tickerinfo-core for convenience
pub use tickerinfo_core::errors::{CacheError, Error, Result};
