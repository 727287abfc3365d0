//! Persistent record stores.
//!
//! The accumulated collection is only ever read whole, appended to, or
//! cleared. Callers receive a [`TelemetryStore`] rather than reaching for a
//! global slot, so the backing technology stays behind one seam.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};

use crate::error::{Result, TelemetryError};
use crate::storage::models::TelemetryRecord;

/// File name used when no store location is configured.
pub const DEFAULT_STORE_FILE: &str = "telemetry_data.json";

/// Read-all / append / clear storage for canonical records.
pub trait TelemetryStore: Send + Sync {
    /// Every stored record, in append order.
    fn load_all(&self) -> Result<Vec<TelemetryRecord>>;

    /// Append a batch after the existing records. Nothing is merged or
    /// deduplicated.
    fn append(&self, batch: &[TelemetryRecord]) -> Result<()>;

    /// Remove every stored record.
    fn clear(&self) -> Result<()>;

    fn len(&self) -> Result<usize> {
        Ok(self.load_all()?.len())
    }

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// Store backed by one JSON array file.
///
/// Writes go to a sibling temp file which is then renamed over the store.
/// The mutex serializes read-modify-write cycles within this process only.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_records(&self) -> Result<Vec<TelemetryRecord>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.storage_error(e)),
        };

        match serde_json::from_str::<Vec<TelemetryRecord>>(&raw) {
            Ok(records) => Ok(records),
            Err(e) => {
                log::warn!(
                    "STORE_CORRUPT path={} error={} action=treat_as_empty",
                    self.path.display(),
                    e
                );
                Ok(Vec::new())
            }
        }
    }

    fn write_records(&self, records: &[TelemetryRecord]) -> Result<()> {
        let bytes = serde_json::to_vec(records).map_err(TelemetryError::StorageEncode)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.storage_error(e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp).map_err(|e| self.storage_error(e))?;
        file.write_all(&bytes).map_err(|e| self.storage_error(e))?;
        file.sync_all().map_err(|e| self.storage_error(e))?;
        drop(file);

        fs::rename(&tmp, &self.path).map_err(|e| self.storage_error(e))
    }

    fn storage_error(&self, source: std::io::Error) -> TelemetryError {
        TelemetryError::Storage {
            path: self.path.clone(),
            source,
        }
    }
}

impl TelemetryStore for JsonFileStore {
    fn load_all(&self) -> Result<Vec<TelemetryRecord>> {
        let _guard = self.lock.lock();
        self.read_records()
    }

    fn append(&self, batch: &[TelemetryRecord]) -> Result<()> {
        let _guard = self.lock.lock();
        let mut records = self.read_records()?;
        let existing = records.len();
        records.extend_from_slice(batch);
        self.write_records(&records)?;

        log::info!(
            "STORE_APPENDED path={} appended={} total={}",
            self.path.display(),
            batch.len(),
            existing + batch.len()
        );
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock();
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(self.storage_error(e)),
        }
        log::info!("STORE_CLEARED path={}", self.path.display());
        Ok(())
    }
}

/// In-process store, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<TelemetryRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<TelemetryRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

impl TelemetryStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<TelemetryRecord>> {
        Ok(self.records.read().clone())
    }

    fn append(&self, batch: &[TelemetryRecord]) -> Result<()> {
        self.records.write().extend_from_slice(batch);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.records.write().clear();
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.records.read().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::instant::Timestamp;

    fn record(device: &str) -> TelemetryRecord {
        TelemetryRecord {
            id: format!("id-{}", device),
            device_id: device.to_string(),
            location: "L1".to_string(),
            timestamp: Timestamp::from_millis(1000.0),
            start_time: Timestamp::from_millis(0.0),
            end_time: Timestamp::from_millis(60_000.0),
            status: "Healthy".to_string(),
            temperature: Some(20.0),
            duration: Some(1),
            vibration: None,
            device_type: String::new(),
        }
    }

    #[test]
    fn test_memory_store_appends_in_order() {
        let store = MemoryStore::new();
        store.append(&[record("a"), record("b")]).unwrap();
        store.append(&[record("a")]).unwrap();

        let devices: Vec<_> = store
            .load_all()
            .unwrap()
            .into_iter()
            .map(|r| r.device_id)
            .collect();
        assert_eq!(devices, vec!["a", "b", "a"]);
        assert_eq!(store.len().unwrap(), 3);

        store.clear().unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_STORE_FILE);
        let store = JsonFileStore::new(&path);
        assert_eq!(store.path(), path.as_path());
        assert!(store.load_all().unwrap().is_empty());
        store.clear().unwrap();
    }
}
