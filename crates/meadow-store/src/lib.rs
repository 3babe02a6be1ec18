//! Meadow Store - persistence for saved sessions and play statistics
//!
//! Records are encoded as JSON. Two backends implement
//! [`RecordStore`](meadow_core::RecordStore):
//! - [`JsonFileStore`]: one `<slot>.json` file per slot in a directory
//! - [`MemoryStore`]: in-process, for tests and hosts without storage
//!
//! Loading a saved session never fails hard: [`load_session_or_none`] logs
//! why a record was rejected and falls back to "no saved session".

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use meadow_core::{
    Catalog, FinalResult, GameSession, PlayStats, RecordError, RecordStore, SessionConfig,
    SessionError,
};
use thiserror::Error;
use tracing::{info, warn};

/// Slot name reserved for the statistics archive
pub const STATS_SLOT: &str = "play_stats";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid record: {0}")]
    Record(#[from] RecordError),

    #[error("Cannot restore session: {0}")]
    Session(#[from] SessionError),

    #[error("Invalid slot name: {0:?}")]
    InvalidSlot(String),
}

/// Slot names become file names, so only a safe subset is allowed
pub(crate) fn check_slot(slot: &str) -> Result<(), StoreError> {
    let safe = !slot.is_empty()
        && slot
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !safe || slot == STATS_SLOT {
        return Err(StoreError::InvalidSlot(slot.to_string()));
    }
    Ok(())
}

/// Save the resumable state of `session` in `slot`
pub fn save_session<S>(store: &mut S, slot: &str, session: &GameSession) -> Result<(), StoreError>
where
    S: RecordStore<Error = StoreError>,
{
    store.save_record(slot, &session.to_record())?;
    info!(slot, placed = session.grid().len(), "session saved");
    Ok(())
}

/// Rebuild the session saved in `slot`, if there is one
pub fn load_session<S>(
    store: &S,
    slot: &str,
    config: SessionConfig,
    catalog: Catalog,
    purchased_extension: bool,
) -> Result<Option<GameSession>, StoreError>
where
    S: RecordStore<Error = StoreError>,
{
    let Some(record) = store.load_record(slot)? else {
        return Ok(None);
    };
    let session = GameSession::from_record(config, catalog, &record, purchased_extension)?;
    info!(slot, "session loaded");
    Ok(Some(session))
}

/// Like [`load_session`], but an unreadable or malformed record counts as
/// no saved session
pub fn load_session_or_none<S>(
    store: &S,
    slot: &str,
    config: SessionConfig,
    catalog: Catalog,
    purchased_extension: bool,
) -> Option<GameSession>
where
    S: RecordStore<Error = StoreError>,
{
    match load_session(store, slot, config, catalog, purchased_extension) {
        Ok(session) => session,
        Err(e) => {
            warn!(slot, error = %e, "saved session rejected");
            None
        }
    }
}

/// Fold a finished game into the stored statistics archive
pub fn archive_result<S>(store: &mut S, result: &FinalResult) -> Result<PlayStats, StoreError>
where
    S: RecordStore<Error = StoreError>,
{
    let mut stats = store.load_stats()?;
    stats.record(result);
    store.save_stats(&stats)?;
    info!(games_played = stats.games_played, best_score = stats.best_score, "result archived");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_names() {
        assert!(check_slot("autosave").is_ok());
        assert!(check_slot("slot-2_b").is_ok());
        assert!(matches!(check_slot(""), Err(StoreError::InvalidSlot(_))));
        assert!(matches!(check_slot("../escape"), Err(StoreError::InvalidSlot(_))));
        assert!(matches!(check_slot("a.json"), Err(StoreError::InvalidSlot(_))));
        assert!(matches!(check_slot(STATS_SLOT), Err(StoreError::InvalidSlot(_))));
    }
}
