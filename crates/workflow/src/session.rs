//! Session store: the one piece of state shared by import and query.
//!
//! Written only by the import submitter after a successful import; read by
//! both submitters at the start of each call.

use crate::error::WorkflowError;
use core_types::SessionId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, warn};

pub trait SessionStore: Send + Sync {
    /// Current identifier, or `None` before the first import.
    fn get(&self) -> Option<SessionId>;

    /// Replace the identifier, whatever was stored before.
    fn set(&self, id: SessionId) -> Result<(), WorkflowError>;
}

/// On-disk layout; the identifier sits under the fixed `session_id` key.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default)]
    session_id: Option<SessionId>,
}

/// Session store persisted as a small JSON file so the identifier survives
/// across runs.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Option<SessionId> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) => {
                debug!(path = %self.path.display(), error = %err, "no stored session");
                return None;
            }
        };
        match serde_json::from_slice::<SessionFile>(&raw) {
            Ok(file) => file.session_id,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring unreadable session file");
                None
            }
        }
    }

    fn set(&self, id: SessionId) -> Result<(), WorkflowError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_vec_pretty(&SessionFile {
            session_id: Some(id),
        })?;
        // write-then-rename keeps readers from seeing a half-written file
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Process-local session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: RwLock<Option<SessionId>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(id: impl Into<SessionId>) -> Self {
        Self {
            slot: RwLock::new(Some(id.into())),
        }
    }
}

impl SessionStore for MemorySessionStore {
    // a panicking writer cannot leave a half-written `Option`, so a
    // poisoned slot is still safe to use
    fn get(&self) -> Option<SessionId> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, id: SessionId) -> Result<(), WorkflowError> {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(id);
        Ok(())
    }
}
