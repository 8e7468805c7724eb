/// Hours a cached record stays valid
pub const CACHE_EXPIRY_HOURS: i64 = 24;

/// Suffix of every per-asset-class cache file
pub const CACHE_FILE_SUFFIX: &str = "_cache.jsonl";

/// Cache horizon as a duration
pub fn cache_expiry() -> chrono::Duration {
    chrono::Duration::hours(CACHE_EXPIRY_HOURS)
}
