//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`ProviderError`]: Failures raised by a single source adapter
//! - [`CatalogError`]: Invalid asset class, attribute or source names
//! - [`RetryClass`]: Classification for determining cascade behavior

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

use crate::models::{AssetClass, Attribute, SourceId};

/// Errors a source adapter can report for one fetch.
///
/// None of these abort a resolution: the engine logs them, records them in
/// the diagnostics and moves on to the next ranked source.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Could not reach the source or it answered with a non-success status.
    #[error("Transport error: {source_id} - {message}")]
    Transport {
        source_id: SourceId,
        message: String,
    },

    /// The call exceeded the per-provider timeout.
    #[error("Timeout: {0}")]
    Timeout(SourceId),

    /// The source answered HTTP 429.
    #[error("Rate limited: {0}")]
    RateLimited(SourceId),

    /// The page or payload did not have the expected shape.
    #[error("Parse error: {source_id} - {message}")]
    Parse {
        source_id: SourceId,
        message: String,
    },

    /// The source has nothing for this instrument.
    #[error("No data: {source_id} - {instrument_id}")]
    NoData {
        source_id: SourceId,
        instrument_id: String,
    },

    /// The source does not serve this asset class.
    #[error("Unsupported asset class: {source_id} - {asset_class}")]
    Unsupported {
        source_id: SourceId,
        asset_class: AssetClass,
    },
}

impl ProviderError {
    pub fn transport(source_id: SourceId, message: impl Into<String>) -> Self {
        Self::Transport {
            source_id,
            message: message.into(),
        }
    }

    pub fn parse(source_id: SourceId, message: impl Into<String>) -> Self {
        Self::Parse {
            source_id,
            message: message.into(),
        }
    }

    /// Maps a reqwest failure the way every adapter does.
    pub fn from_reqwest(source_id: SourceId, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout(source_id);
        }
        if err.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS) {
            return Self::RateLimited(source_id);
        }
        if err.is_decode() {
            return Self::parse(source_id, err.to_string());
        }
        Self::transport(source_id, err.to_string())
    }

    /// Returns the retry classification for this error.
    ///
    /// - [`RetryClass::FailoverWithPenalty`]: transport trouble; counts toward
    ///   opening the source's circuit
    /// - [`RetryClass::NextProvider`]: the source works but cannot help here
    ///
    /// # Examples
    ///
    /// ```
    /// use tickerinfo_market_data::errors::{ProviderError, RetryClass};
    /// use tickerinfo_market_data::SourceId;
    ///
    /// let error = ProviderError::RateLimited(SourceId::Fundamentus);
    /// assert_eq!(error.retry_class(), RetryClass::FailoverWithPenalty);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Transport { .. } | Self::Timeout(_) | Self::RateLimited(_) => {
                RetryClass::FailoverWithPenalty
            }
            Self::Parse { .. } | Self::NoData { .. } | Self::Unsupported { .. } => {
                RetryClass::NextProvider
            }
        }
    }
}

/// Rejected names in a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Unknown asset class: {0}")]
    UnknownAssetClass(String),

    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("Attribute {attribute} is not available for {asset_class}")]
    AttributeNotInCatalog {
        asset_class: AssetClass,
        attribute: Attribute,
    },

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Source {source_id} does not serve {asset_class}")]
    SourceNotRanked {
        asset_class: AssetClass,
        source_id: SourceId,
    },
}
