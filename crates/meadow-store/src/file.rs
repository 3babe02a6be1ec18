//! Directory-backed store.

use crate::{check_slot, StoreError, STATS_SLOT};
use meadow_core::{PlayStats, RecordStore, SessionRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stores each slot as `<dir>/<slot>.json`
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open a store in `dir`, creating the directory if needed
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    fn read<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, StoreError> {
        let text = match fs::read_to_string(self.path(name)) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&text)?))
    }

    /// Write through a temporary file so a crash never leaves half a record
    fn write<T: Serialize>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        let path = self.path(name);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(value)?)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), "wrote slot");
        Ok(())
    }
}

impl RecordStore for JsonFileStore {
    type Error = StoreError;

    fn load_record(&self, slot: &str) -> Result<Option<SessionRecord>, StoreError> {
        check_slot(slot)?;
        self.read(slot)
    }

    fn save_record(&mut self, slot: &str, record: &SessionRecord) -> Result<(), StoreError> {
        check_slot(slot)?;
        self.write(slot, record)
    }

    fn clear_record(&mut self, slot: &str) -> Result<(), StoreError> {
        check_slot(slot)?;
        match fs::remove_file(self.path(slot)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn load_stats(&self) -> Result<PlayStats, StoreError> {
        Ok(self.read(STATS_SLOT)?.unwrap_or_default())
    }

    fn save_stats(&mut self, stats: &PlayStats) -> Result<(), StoreError> {
        self.write(STATS_SLOT, stats)
    }
}
