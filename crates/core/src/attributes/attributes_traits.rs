use async_trait::async_trait;

use crate::attributes::attributes_model::{AttributeLookup, AttributeRequest};
use crate::errors::Result;
use tickerinfo_market_data::{AssetClass, AttributeRecord};

/// Merge cache with one logical store per asset class.
///
/// Identifiers match exactly: `AAA` never finds an entry stored as `AAAB`.
pub trait AttributeCacheStore: Send + Sync {
    /// The cached record, if present and younger than the cache horizon.
    /// An expired entry is removed and reported as absent.
    fn read(&self, asset_class: AssetClass, instrument_id: &str) -> Result<Option<AttributeRecord>>;

    /// Merges `record` into the stored one (or creates it) and restarts its
    /// expiry clock.
    fn write(&self, asset_class: AssetClass, instrument_id: &str, record: &AttributeRecord) -> Result<()>;

    fn clear_one(&self, asset_class: AssetClass, instrument_id: &str) -> Result<()>;

    /// Drops the whole store of `asset_class`.
    fn clear_all(&self, asset_class: AssetClass) -> Result<()>;
}

/// Trait for attribute lookup operations
#[async_trait]
pub trait AttributeServiceTrait: Send + Sync {
    async fn get_attributes(&self, request: AttributeRequest) -> Result<AttributeLookup>;
}
