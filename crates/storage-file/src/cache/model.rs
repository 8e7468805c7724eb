use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use tickerinfo_market_data::AttributeRecord;

/// One line of a cache file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub id: String,
    pub cached_at: DateTime<Utc>,
    pub record: AttributeRecord,
}

impl CacheEntry {
    pub fn new(id: &str, record: AttributeRecord, cached_at: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            cached_at,
            record,
        }
    }

    /// An entry exactly `horizon` old is still fresh.
    pub fn is_expired(&self, now: DateTime<Utc>, horizon: Duration) -> bool {
        now - self.cached_at > horizon
    }
}
