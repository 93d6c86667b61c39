//! Resumable on-disk session state.
//!
//! One JSON file per processing root holds the full [`SessionState`]. Saves
//! go through a temporary file and a rename, so a crash mid-write leaves the
//! previous state intact. Backups are timestamped copies in a sibling
//! directory; they are only ever added, never overwritten or pruned.
//!
//! [`SessionState`]: crate::session::SessionState

mod store;

use std::path::PathBuf;

use thiserror::Error;

pub use store::SessionStore;

/// Errors raised by the session store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The state file exists but cannot be read back.
    #[error("Persisted state {path:?} is corrupt: {reason}")]
    PersistedStateCorrupt { path: PathBuf, reason: String },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
