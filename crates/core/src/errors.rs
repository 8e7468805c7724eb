//! Core error types for the Ticker Info service.
//!
//! Storage-specific failures are converted to [`CacheError`] by the storage
//! layer so this type stays backend-agnostic.

use thiserror::Error;

use tickerinfo_market_data::{AssetClass, CatalogError};

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for attribute lookups.
#[derive(Error, Debug)]
pub enum Error {
    /// Unknown asset class, attribute or source in the request.
    #[error("Invalid request: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Cache operation failed: {0}")]
    Cache(#[from] CacheError),

    /// Neither the cache nor any source had anything for the instrument.
    #[error("No data found for {asset_class} '{instrument_id}'")]
    NoDataFound {
        asset_class: AssetClass,
        instrument_id: String,
    },

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Failures of a cache backend.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache lock poisoned: {0}")]
    LockPoisoned(String),
}

// === From implementations for common error types ===

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Cache(CacheError::Io(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Cache(CacheError::Serialization(err))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
