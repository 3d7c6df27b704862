//! Session Persistence
//!
//! Saves a snapshot of the wizard state to disk after meaningful changes so
//! an interrupted session can be resumed. Snapshots carry a save timestamp
//! and go stale after one hour; a stale or unreadable-timestamp snapshot is
//! ignored rather than restored into a confusing half-session.
//!
//! Save failures are deliberately quiet: persistence is a convenience, and a
//! full disk should never block the wizard itself.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::core::wizard::WizardState;

/// Snapshots older than this are discarded on restore.
pub fn freshness_window() -> Duration {
    Duration::hours(1)
}

const SNAPSHOT_FILE: &str = "session.json";

/// What gets written to disk: the wizard state plus the save timestamp.
///
/// The quality score is not persisted; it is recomputed from the restored
/// result so scoring changes apply to old snapshots too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// RFC 3339 save time. Snapshots without one are treated as stale.
    #[serde(default)]
    pub saved_at: Option<String>,
    pub state: WizardState,
}

/// Lightweight description of a saved snapshot, for listing resumable
/// sessions without deserializing the whole state into a live wizard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub step: crate::core::wizard::WizardStep,
    pub saved_at: Option<String>,
    /// Whether [`restore`](SessionStore::restore) would accept it.
    pub fresh: bool,
}

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to write session snapshot: {0}")]
    Write(#[source] std::io::Error),

    #[error("Failed to read session snapshot: {0}")]
    Read(#[source] std::io::Error),

    #[error("Session snapshot is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Stores at most one session snapshot in the data directory.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store rooted at `data_dir`; the directory is created on first save.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(SNAPSHOT_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a snapshot of `state`, stamped with the current time.
    pub fn save(&self, state: &WizardState) -> Result<(), SessionError> {
        let snapshot = SessionSnapshot {
            saved_at: Some(Utc::now().to_rfc3339()),
            state: state.clone(),
        };
        let json = serde_json::to_string_pretty(&snapshot)?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(SessionError::Write)?;
        }
        std::fs::write(&self.path, json).map_err(SessionError::Write)?;
        tracing::debug!(path = %self.path.display(), "session snapshot saved");
        Ok(())
    }

    /// Restore the saved state, if a fresh snapshot exists.
    ///
    /// `Ok(None)` covers the benign cases: no snapshot, a snapshot older
    /// than [`freshness_window`], or one without a usable timestamp. `Err`
    /// is reserved for actual read or parse failures.
    pub fn restore(&self) -> Result<Option<WizardState>, SessionError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SessionError::Read(e)),
        };

        let snapshot: SessionSnapshot = serde_json::from_str(&contents)?;

        let Some(saved_at) = snapshot.saved_at.as_deref() else {
            tracing::info!("session snapshot has no timestamp, ignoring");
            return Ok(None);
        };
        let saved_at = match DateTime::parse_from_rfc3339(saved_at) {
            Ok(t) => t.with_timezone(&Utc),
            Err(e) => {
                tracing::info!(error = %e, "session snapshot timestamp unreadable, ignoring");
                return Ok(None);
            }
        };

        if Utc::now().signed_duration_since(saved_at) > freshness_window() {
            tracing::info!("session snapshot is stale, ignoring");
            return Ok(None);
        }

        Ok(Some(snapshot.state))
    }

    /// Describe the saved snapshot without restoring it, for host shells
    /// that list resumable sessions. `Ok(None)` when nothing is saved.
    pub fn summary(&self) -> Result<Option<SessionSummary>, SessionError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SessionError::Read(e)),
        };
        let snapshot: SessionSnapshot = serde_json::from_str(&contents)?;

        let fresh = snapshot
            .saved_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| Utc::now().signed_duration_since(t.with_timezone(&Utc)) <= freshness_window())
            .unwrap_or(false);

        Ok(Some(SessionSummary {
            step: snapshot.state.step,
            saved_at: snapshot.saved_at,
            fresh,
        }))
    }

    /// Remove the snapshot. Missing file is not an error.
    pub fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::Write(e)),
        }
    }
}
