//! Session storage for saved icon placements.
//!
//! Each save creates a new session under a fresh UUID. Sessions live in
//! memory and, when a data directory is configured, are mirrored to one JSON
//! file per session so they survive restarts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use iconmark_core::PersistedIconRecord;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store has no data directory.
    #[error("No data directory configured")]
    NoDataDir,
    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A session file could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// On-disk form of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDocument {
    /// Session identifier.
    pub session_id: String,
    /// Saved icons in placement order.
    pub placed_icons: Vec<PersistedIconRecord>,
    /// Unix timestamp in milliseconds.
    pub saved_at: u64,
}

/// Thread-safe session storage shared by the HTTP handlers.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Vec<PersistedIconRecord>>>>,
    data_dir: Option<PathBuf>,
}

impl SessionStore {
    /// Create an in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store persisted under `data_dir` and load every session
    /// already stored there.
    ///
    /// Files that fail to parse are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created or read.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        let store = Self {
            sessions: Arc::default(),
            data_dir: Some(data_dir),
        };
        let loaded = store.load_all_sessions()?;
        tracing::info!("Loaded {} persisted session(s)", loaded.len());
        Ok(store)
    }

    /// Data directory, if persistence is enabled.
    #[must_use]
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Store `records` under a new session id and return the id.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting to disk fails; the session is then not
    /// kept in memory either.
    pub fn save(&self, records: Vec<PersistedIconRecord>) -> StoreResult<String> {
        let session_id = Uuid::new_v4().to_string();
        self.persist_session(&session_id, &records)?;

        let count = records.len();
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session_id.clone(), records);

        tracing::debug!("Saved session {session_id} with {count} icon(s)");
        Ok(session_id)
    }

    /// Icons saved under `session_id`, if the session exists.
    #[must_use]
    pub fn get(&self, session_id: &str) -> Option<Vec<PersistedIconRecord>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .cloned()
    }

    /// All known session ids.
    #[must_use]
    pub fn session_ids(&self) -> Vec<String> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Number of sessions held in memory.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no sessions are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    fn session_path(data_dir: &Path, session_id: &str) -> PathBuf {
        data_dir.join(format!("{}.json", sanitize_filename(session_id)))
    }

    /// Write a session file. No-op without a data directory.
    fn persist_session(&self, session_id: &str, records: &[PersistedIconRecord]) -> StoreResult<()> {
        let Some(data_dir) = &self.data_dir else {
            return Ok(());
        };
        let doc = SessionDocument {
            session_id: session_id.to_string(),
            placed_icons: records.to_vec(),
            saved_at: current_timestamp_ms(),
        };
        let path = Self::session_path(data_dir, session_id);
        std::fs::write(&path, serde_json::to_vec_pretty(&doc)?)?;
        tracing::trace!("Persisted session {session_id} to {}", path.display());
        Ok(())
    }

    /// Load a single session from disk into memory.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no data directory, or the file is missing
    /// or unparseable.
    pub fn load_session_from_disk(&self, session_id: &str) -> StoreResult<()> {
        let data_dir = self.data_dir.as_ref().ok_or(StoreError::NoDataDir)?;
        let contents = std::fs::read(Self::session_path(data_dir, session_id))?;
        let doc: SessionDocument = serde_json::from_slice(&contents)?;
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(doc.session_id, doc.placed_icons);
        Ok(())
    }

    /// Discover and load all persisted sessions from the data directory.
    ///
    /// Returns the ids that were loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no data directory or it can't be read.
    pub fn load_all_sessions(&self) -> StoreResult<Vec<String>> {
        let data_dir = self.data_dir.as_ref().ok_or(StoreError::NoDataDir)?;
        let mut loaded = Vec::new();
        for entry in std::fs::read_dir(data_dir)? {
            let path = entry?.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match self.load_session_from_disk(stem) {
                Ok(()) => loaded.push(stem.to_string()),
                Err(e) => tracing::warn!("Skipping session file {}: {e}", path.display()),
            }
        }
        Ok(loaded)
    }
}

/// Sanitize a session ID for use as a filename.
///
/// Replaces any character that is not alphanumeric, `-`, or `_` with `_`.
fn sanitize_filename(session_id: &str) -> String {
    session_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Current Unix timestamp in milliseconds.
fn current_timestamp_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| {
        #[allow(clippy::cast_possible_truncation)]
        {
            d.as_millis() as u64
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(x: f64, src: &str) -> PersistedIconRecord {
        PersistedIconRecord {
            x,
            y: 2.0,
            size: 50.0,
            img_src: src.to_string(),
        }
    }

    #[test]
    fn test_save_returns_uuid_and_keeps_order() {
        let store = SessionStore::new();
        let id = store
            .save(vec![record(1.0, "a.png"), record(2.0, "b.png")])
            .expect("save");
        assert!(Uuid::parse_str(&id).is_ok());

        let icons = store.get(&id).expect("session");
        assert_eq!(icons[0].img_src, "a.png");
        assert_eq!(icons[1].img_src, "b.png");
    }

    #[test]
    fn test_each_save_gets_a_new_session() {
        let store = SessionStore::new();
        let a = store.save(vec![]).expect("save");
        let b = store.save(vec![]).expect("save");
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&a), Some(vec![]));
    }

    #[test]
    fn test_unknown_session_is_none() {
        assert!(SessionStore::new().get("nope").is_none());
    }

    #[test]
    fn test_in_memory_store_has_no_disk_sessions() {
        assert!(matches!(
            SessionStore::new().load_all_sessions(),
            Err(StoreError::NoDataDir)
        ));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("abc-123_x"), "abc-123_x");
        assert_eq!(sanitize_filename("../../etc/passwd"), "______etc_passwd");
    }

    #[test]
    fn test_persisted_file_uses_wire_field_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::with_data_dir(dir.path()).expect("store");
        let id = store.save(vec![record(1.0, "a.png")]).expect("save");

        let raw = std::fs::read_to_string(dir.path().join(format!("{id}.json"))).expect("file");
        let json: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(json["sessionId"], id.as_str());
        assert_eq!(json["placedIcons"][0]["imgSrc"], "a.png");
        assert!(json["savedAt"].as_u64().is_some());
    }
}
