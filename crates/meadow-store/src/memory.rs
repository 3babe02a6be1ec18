//! In-memory store.

use crate::{check_slot, StoreError};
use meadow_core::{PlayStats, RecordStore, SessionRecord};
use std::collections::HashMap;

/// Keeps encoded records in a map, so the JSON round trip is still exercised
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: HashMap<String, String>,
    stats: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw text in a slot, bypassing encoding
    pub fn insert_raw(&mut self, slot: &str, text: impl Into<String>) {
        self.slots.insert(slot.to_string(), text.into());
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl RecordStore for MemoryStore {
    type Error = StoreError;

    fn load_record(&self, slot: &str) -> Result<Option<SessionRecord>, StoreError> {
        check_slot(slot)?;
        match self.slots.get(slot) {
            Some(text) => Ok(Some(SessionRecord::from_json(text)?)),
            None => Ok(None),
        }
    }

    fn save_record(&mut self, slot: &str, record: &SessionRecord) -> Result<(), StoreError> {
        check_slot(slot)?;
        self.slots.insert(slot.to_string(), record.to_json()?);
        Ok(())
    }

    fn clear_record(&mut self, slot: &str) -> Result<(), StoreError> {
        check_slot(slot)?;
        self.slots.remove(slot);
        Ok(())
    }

    fn load_stats(&self) -> Result<PlayStats, StoreError> {
        match &self.stats {
            Some(text) => Ok(serde_json::from_str(text)?),
            None => Ok(PlayStats::default()),
        }
    }

    fn save_stats(&mut self, stats: &PlayStats) -> Result<(), StoreError> {
        self.stats = Some(serde_json::to_string(stats)?);
        Ok(())
    }
}
