use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tickerinfo_core::constants::CACHE_FILE_SUFFIX;
use tickerinfo_core::errors::{Error, Result};
use tickerinfo_core::AttributeCacheStore;
use tickerinfo_market_data::{AssetClass, AttributeRecord};

use super::store::FileCacheStore;

/// One [`FileCacheStore`] per asset class, all under the same directory.
pub struct FileCacheRepository {
    dir: PathBuf,
    stores: HashMap<AssetClass, FileCacheStore>,
}

impl FileCacheRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let stores = AssetClass::ALL
            .iter()
            .map(|class| (*class, FileCacheStore::new(Self::file_for(&dir, *class))))
            .collect();

        Self { dir, stores }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<class>_cache.jsonl`
    pub fn file_for(dir: &Path, asset_class: AssetClass) -> PathBuf {
        dir.join(format!("{}{}", asset_class.as_str(), CACHE_FILE_SUFFIX))
    }

    fn store(&self, asset_class: AssetClass) -> Result<&FileCacheStore> {
        self.stores
            .get(&asset_class)
            .ok_or_else(|| Error::Unexpected(format!("No cache store for {}", asset_class)))
    }
}

impl AttributeCacheStore for FileCacheRepository {
    fn read(&self, asset_class: AssetClass, instrument_id: &str) -> Result<Option<AttributeRecord>> {
        self.store(asset_class)?.read(instrument_id)
    }

    fn write(&self, asset_class: AssetClass, instrument_id: &str, record: &AttributeRecord) -> Result<()> {
        self.store(asset_class)?.write(instrument_id, record)
    }

    fn clear_one(&self, asset_class: AssetClass, instrument_id: &str) -> Result<()> {
        self.store(asset_class)?.clear_one(instrument_id)
    }

    fn clear_all(&self, asset_class: AssetClass) -> Result<()> {
        self.store(asset_class)?.clear_all()
    }
}
