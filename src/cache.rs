//! # Daily and Yearly Record Caching
//!
//! This module persists one day's prayer timings and the 365-day simulation
//! dataset, so the clock survives restarts without hammering the provider
//! and a simulation run can resume from cached data.
//!
//! ## Validity rules
//!
//! All validity checks live here, in one place:
//! - **Daily entry**: served only when the stored dateKey matches the
//!   requested dateKey *and* the entry is younger than 24 hours. The cache
//!   is keyed to "today"; an entry for a past or future date is never
//!   served. Invalid entries are evicted on load.
//! - **Yearly dataset**: identity-based only. Served when the stored
//!   simulation start dateKey matches the requested one; no time expiry.
//!
//! ## Storage
//!
//! Entries live in a string key-value store behind the [`KeyValueStore`]
//! trait: a JSON file on disk for the application ([`FileStore`]) or a
//! plain map for tests and memory-only fallback ([`MemoryStore`]). The
//! persisted layout keeps one key per concern (location label, daily
//! timings, daily stamp, yearly dataset, yearly start date, last-known
//! coordinates), each value an opaque JSON string.
//!
//! ## Failure mode
//!
//! Write failures (disk full, permissions) are non-fatal: callers keep
//! their in-memory data, surface a short warning, and continue.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Coordinates, DailyTimings, DateKey, YearDataset};

/// Daily entries older than this are stale.
pub const DAILY_TTL_MS: i64 = 24 * 60 * 60 * 1000;

const KEY_LOCATION: &str = "location_label";
const KEY_DAILY_TIMINGS: &str = "daily_timings";
const KEY_DAILY_STAMP: &str = "daily_stamp";
const KEY_YEARLY_DATA: &str = "yearly_dataset";
const KEY_YEARLY_START: &str = "yearly_start_date";
const KEY_COORDS: &str = "last_coords";

/// Errors from cache persistence. None of these abort the caller; they
/// degrade to memory-only operation with a surfaced warning.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Serializing an entry failed (should not happen for our own types).
    #[error("cache serialization: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Writing the backing store failed (quota, permissions, disk).
    #[error("cache IO: {0}")]
    Io(#[from] io::Error),
}

/// A string key-value store, the shape of the externally visible persisted
/// state: every value is an opaque string.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&mut self, key: &str, value: String) -> Result<(), CacheError>;
    fn remove(&mut self, key: &str);
}

/// In-memory store for tests and for memory-only fallback.
#[derive(Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: String) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// File-backed store: the whole map serialized as one JSON object,
/// rewritten on every mutation. Small enough that this stays cheap, and a
/// crash can only lose the last write.
pub struct FileStore {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl FileStore {
    /// Open a store at `path`. A missing or corrupt file starts empty;
    /// only later writes can fail.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read(&path) {
            Ok(data) => match serde_json::from_slice(&data) {
                Ok(map) => map,
                Err(e) => {
                    warn!("cache file {} is corrupt, starting empty: {e}", path.display());
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        FileStore { path, entries }
    }

    fn persist(&self) -> Result<(), CacheError> {
        let data = serde_json::to_vec(&self.entries)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: String) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), value);
        self.persist()
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        // Removal is cleanup; a failed rewrite only leaves stale bytes
        // that the validity checks reject again on the next load.
        if let Err(e) = self.persist() {
            warn!("cache eviction write failed: {e}");
        }
    }
}

/// Freshness stamp stored alongside the daily entry.
#[derive(Debug, Serialize, Deserialize)]
struct DailyStamp {
    fetched_at_ms: i64,
    date_key: DateKey,
}

/// A valid daily cache hit.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyEntry {
    pub location_label: String,
    pub timings: DailyTimings,
    pub date_key: DateKey,
}

/// Typed cache over a [`KeyValueStore`], enforcing the daily TTL/dateKey
/// rules and the yearly start-key identity rule.
pub struct PrayerCache<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> PrayerCache<S> {
    pub fn new(store: S) -> Self {
        PrayerCache { store }
    }

    /// Store today's timings, overwriting any prior entry.
    pub fn save_daily(
        &mut self,
        location_label: &str,
        timings: &DailyTimings,
        date_key: DateKey,
        now_ms: i64,
    ) -> Result<(), CacheError> {
        let stamp = DailyStamp {
            fetched_at_ms: now_ms,
            date_key,
        };
        self.store
            .put(KEY_LOCATION, location_label.to_string())?;
        self.store
            .put(KEY_DAILY_TIMINGS, serde_json::to_string(timings)?)?;
        self.store
            .put(KEY_DAILY_STAMP, serde_json::to_string(&stamp)?)?;
        Ok(())
    }

    /// Load the daily entry for `date_key`, evicting and returning `None`
    /// when the stored entry is for another day or older than 24 hours.
    pub fn load_daily(&mut self, date_key: DateKey, now_ms: i64) -> Option<DailyEntry> {
        let stamp: DailyStamp = serde_json::from_str(&self.store.get(KEY_DAILY_STAMP)?).ok()?;
        if now_ms - stamp.fetched_at_ms > DAILY_TTL_MS || stamp.date_key != date_key {
            self.invalidate_daily();
            return None;
        }
        let location_label = self.store.get(KEY_LOCATION)?;
        let timings: DailyTimings =
            serde_json::from_str(&self.store.get(KEY_DAILY_TIMINGS)?).ok()?;
        Some(DailyEntry {
            location_label,
            timings,
            date_key: stamp.date_key,
        })
    }

    /// Drop the daily entry and its stamp.
    pub fn invalidate_daily(&mut self) {
        self.store.remove(KEY_LOCATION);
        self.store.remove(KEY_DAILY_TIMINGS);
        self.store.remove(KEY_DAILY_STAMP);
    }

    /// Store a full simulation dataset keyed by its start date.
    pub fn save_yearly(
        &mut self,
        dataset: &YearDataset,
        start: DateKey,
    ) -> Result<(), CacheError> {
        self.store
            .put(KEY_YEARLY_DATA, serde_json::to_string(&dataset.days)?)?;
        self.store.put(KEY_YEARLY_START, start.iso())?;
        Ok(())
    }

    /// Load the yearly dataset for a simulation starting at `start`,
    /// evicting and returning `None` when the stored start date differs.
    /// Yearly data has no time-based expiry.
    pub fn load_yearly(&mut self, start: DateKey) -> Option<YearDataset> {
        let stored_start = self.store.get(KEY_YEARLY_START)?;
        if stored_start != start.iso() {
            self.invalidate_yearly();
            return None;
        }
        let days = match serde_json::from_str(&self.store.get(KEY_YEARLY_DATA)?) {
            Ok(days) => days,
            Err(e) => {
                warn!("yearly cache is corrupt, evicting: {e}");
                self.invalidate_yearly();
                return None;
            }
        };
        Some(YearDataset {
            start: start.0,
            days,
        })
    }

    /// Drop the yearly dataset and its start key.
    pub fn invalidate_yearly(&mut self) {
        self.store.remove(KEY_YEARLY_DATA);
        self.store.remove(KEY_YEARLY_START);
    }

    /// Remember the last geolocated coordinates for later yearly fetches.
    pub fn save_coords(&mut self, coords: Coordinates) -> Result<(), CacheError> {
        self.store
            .put(KEY_COORDS, serde_json::to_string(&coords)?)
    }

    pub fn load_coords(&self) -> Option<Coordinates> {
        serde_json::from_str(&self.store.get(KEY_COORDS)?).ok()
    }
}
