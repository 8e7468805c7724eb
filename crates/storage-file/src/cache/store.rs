use std::ffi::OsString;
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};

use tickerinfo_core::constants::cache_expiry;
use tickerinfo_core::errors::{CacheError, Result};
use tickerinfo_market_data::AttributeRecord;

use super::model::CacheEntry;

/// Merge cache for one asset class, stored as one JSON object per line.
///
/// Every operation holds the lock for its whole read-modify-write span and
/// replaces the file through a temporary sibling and a rename, so a reader
/// never sees a half-written file.
#[derive(Debug)]
pub struct FileCacheStore {
    path: PathBuf,
    horizon: Duration,
    lock: Mutex<()>,
}

impl FileCacheStore {
    pub fn new(path: PathBuf) -> Self {
        Self::with_expiry(path, cache_expiry())
    }

    pub fn with_expiry(path: PathBuf, horizon: Duration) -> Self {
        Self {
            path,
            horizon,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self, id: &str) -> Result<Option<AttributeRecord>> {
        self.read_at(id, Utc::now())
    }

    pub fn write(&self, id: &str, record: &AttributeRecord) -> Result<()> {
        self.write_at(id, record, Utc::now())
    }

    pub fn clear_one(&self, id: &str) -> Result<()> {
        let _guard = self.lock()?;
        if !self.path.exists() {
            return Ok(());
        }

        let mut entries = self.load_locked()?;
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        if entries.len() != before {
            self.persist_locked(&entries)?;
            info!("Cache cleaning completed for '{}'", id);
        }
        Ok(())
    }

    pub fn clear_all(&self) -> Result<()> {
        let _guard = self.lock()?;
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Cache deletion completed for {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn read_at(&self, id: &str, now: DateTime<Utc>) -> Result<Option<AttributeRecord>> {
        let _guard = self.lock()?;
        let mut entries = self.load_locked()?;

        let Some(position) = entries.iter().position(|entry| entry.id == id) else {
            debug!("No cache entry found for '{}'", id);
            return Ok(None);
        };

        if !entries[position].is_expired(now, self.horizon) {
            debug!(
                "Cache hit for '{}' (cached at {})",
                id, entries[position].cached_at
            );
            return Ok(Some(entries.swap_remove(position).record));
        }

        debug!(
            "Cache expired for '{}' (cached at {})",
            id, entries[position].cached_at
        );
        entries.remove(position);
        self.persist_locked(&entries)?;
        Ok(None)
    }

    fn write_at(&self, id: &str, record: &AttributeRecord, now: DateTime<Utc>) -> Result<()> {
        let _guard = self.lock()?;
        let mut entries = self.load_locked()?;

        match entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                entry.record.merge(record.clone());
                entry.cached_at = now;
                info!("Cache updated for '{}'", id);
            }
            None => {
                entries.push(CacheEntry::new(id, record.clone(), now));
                info!("New cache entry created for '{}'", id);
            }
        }

        self.persist_locked(&entries)
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| CacheError::LockPoisoned(self.path.display().to_string()).into())
    }

    /// Parses every line; unparsable ones are logged and skipped.
    fn load_locked(&self) -> Result<Vec<CacheEntry>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let entries = raw
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(index, line)| match serde_json::from_str::<CacheEntry>(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(
                        "Skipping corrupt cache line {} in {}: {}",
                        index + 1,
                        self.path.display(),
                        e
                    );
                    None
                }
            })
            .collect();
        Ok(entries)
    }

    fn persist_locked(&self, entries: &[CacheEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.tmp_path();
        {
            let mut writer = BufWriter::new(fs::File::create(&tmp_path)?);
            for entry in entries {
                serde_json::to_writer(&mut writer, entry)?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickerinfo_market_data::{Attribute, AttributeValue};

    fn store(dir: &tempfile::TempDir) -> FileCacheStore {
        FileCacheStore::new(dir.path().join("stock_cache.jsonl"))
    }

    fn record(pairs: &[(Attribute, AttributeValue)]) -> AttributeRecord {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn test_missing_file_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        assert_eq!(store.read("ACME").unwrap(), None);
        store.clear_one("ACME").unwrap();
        store.clear_all().unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let price = record(&[(Attribute::Price, 10.5.into())]);

        store.write("ACME", &price).unwrap();

        assert_eq!(store.read("ACME").unwrap(), Some(price));
    }

    #[test]
    fn test_write_merges_into_existing_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        store
            .write("ACME", &record(&[(Attribute::Price, 1.0.into()), (Attribute::Dy, 3.0.into())]))
            .unwrap();
        store
            .write(
                "ACME",
                &record(&[
                    (Attribute::Price, 2.0.into()),
                    (Attribute::Name, "ACME".into()),
                    (Attribute::Dy, AttributeValue::Null),
                ]),
            )
            .unwrap();

        assert_eq!(
            store.read("ACME").unwrap(),
            Some(record(&[
                (Attribute::Price, 2.0.into()),
                (Attribute::Name, "ACME".into()),
                (Attribute::Dy, 3.0.into()),
            ]))
        );
    }

    #[test]
    fn test_fresh_entry_within_horizon_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let now = Utc::now();
        let price = record(&[(Attribute::Price, 10.5.into())]);

        store.write_at("ACME", &price, now - Duration::hours(1)).unwrap();

        assert_eq!(store.read_at("ACME", now).unwrap(), Some(price));
    }

    #[test]
    fn test_expired_entry_is_purged_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let now = Utc::now();

        store
            .write_at("ACME", &record(&[(Attribute::Price, 10.5.into())]), now - Duration::hours(25))
            .unwrap();
        store
            .write_at("OTHER", &record(&[(Attribute::Price, 1.0.into())]), now)
            .unwrap();

        assert_eq!(store.read_at("ACME", now).unwrap(), None);

        let contents = fs::read_to_string(store.path()).unwrap();
        assert!(!contents.contains("\"ACME\""));
        assert!(contents.contains("\"OTHER\""));
    }

    #[test]
    fn test_write_restarts_expiry_clock() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let now = Utc::now();

        store
            .write_at("ACME", &record(&[(Attribute::Price, 1.0.into())]), now - Duration::hours(23))
            .unwrap();
        store
            .write_at("ACME", &record(&[(Attribute::Name, "ACME".into())]), now)
            .unwrap();

        let later = now + Duration::hours(2);
        assert!(store.read_at("ACME", later).unwrap().is_some());
    }

    #[test]
    fn test_identifiers_match_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        store
            .write("AAAB", &record(&[(Attribute::Price, 1.0.into())]))
            .unwrap();

        assert_eq!(store.read("AAA").unwrap(), None);
        store.clear_one("AAA").unwrap();
        assert!(store.read("AAAB").unwrap().is_some());
    }

    #[test]
    fn test_clear_one_then_read_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        store
            .write("ACME", &record(&[(Attribute::Price, 1.0.into())]))
            .unwrap();
        store
            .write("OTHER", &record(&[(Attribute::Price, 2.0.into())]))
            .unwrap();
        store.clear_one("ACME").unwrap();

        assert_eq!(store.read("ACME").unwrap(), None);
        assert!(store.read("OTHER").unwrap().is_some());
    }

    #[test]
    fn test_clear_all_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        store
            .write("ACME", &record(&[(Attribute::Price, 1.0.into())]))
            .unwrap();
        store.clear_all().unwrap();

        assert!(!store.path().exists());
        assert_eq!(store.read("ACME").unwrap(), None);
    }

    #[test]
    fn test_corrupt_lines_are_skipped_and_dropped_on_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let good = CacheEntry::new("ACME", record(&[(Attribute::Price, 10.5.into())]), Utc::now());
        let contents = format!(
            "{}\nnot json at all\n{{\"id\":\"X\"}}\n",
            serde_json::to_string(&good).unwrap()
        );
        fs::write(store.path(), contents).unwrap();

        assert_eq!(store.read("ACME").unwrap(), Some(good.record.clone()));

        store
            .write("OTHER", &record(&[(Attribute::Price, 1.0.into())]))
            .unwrap();
        let rewritten = fs::read_to_string(store.path()).unwrap();
        assert_eq!(rewritten.lines().count(), 2);
        assert!(!dir.path().join("stock_cache.jsonl.tmp").exists());
    }

    #[test]
    fn test_lines_are_json_objects() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        store
            .write(
                "ACME",
                &record(&[(Attribute::Max52Weeks, 5.0.into()), (Attribute::Name, AttributeValue::Null)]),
            )
            .unwrap();

        let line = fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["id"], "ACME");
        assert_eq!(value["record"]["max_52_weeks"], 5.0);
        assert!(value["record"]["name"].is_null());
        assert!(value["cached_at"].as_str().is_some());
    }
}
