//! Durable storage for the whole core: one versioned JSON document
//! holding every collection, written atomically (temp file + rename) so a
//! crash mid-save never corrupts the previous snapshot.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::lifecycle::OrderCoordinator;

pub const SNAPSHOT_VERSION: &str = "1";

/// Errors that can occur during snapshot operations
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: String, found: String },
}

/// The persisted shape: the coordinator's collections plus versioning
/// metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: String,
    pub saved_at: DateTime<Utc>,
    pub state: OrderCoordinator,
}

impl Snapshot {
    pub fn of(state: &OrderCoordinator) -> Self {
        Self {
            version: SNAPSHOT_VERSION.to_string(),
            saved_at: Utc::now(),
            state: state.clone(),
        }
    }
}

/// File system snapshot store.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the snapshot, or `None` when no snapshot has been written
    /// yet. A version mismatch is an error, not a silent migration.
    pub fn load(&self) -> Result<Option<Snapshot>, PersistenceError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no snapshot on disk");
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        let snapshot: Snapshot = serde_json::from_str(&raw)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(PersistenceError::VersionMismatch {
                expected: SNAPSHOT_VERSION.to_string(),
                found: snapshot.version,
            });
        }
        Ok(Some(snapshot))
    }

    /// Write atomically: serialize to a sibling temp file, then rename
    /// over the target.
    pub fn save(&self, state: &OrderCoordinator) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let snapshot = Snapshot::of(state);
        let raw = serde_json::to_string_pretty(&snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        info!(
            path = %self.path.display(),
            orders = state.store.len(),
            "snapshot saved"
        );
        Ok(())
    }
}
