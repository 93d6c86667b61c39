//! The annotation session: position, working set and visited-crop overrides.
//!
//! ## Lifecycle
//!
//! ```text
//! Loading ──> Viewing ──(edit)──> Viewing
//!                │
//!                └──(advance)──> Saving ──> Loading ──> Viewing
//!                                                 └──> Closed (close)
//! ```
//!
//! Every event comes in synchronously from the front end, so the phase is
//! only ever observed as `Viewing` or `Closed` from the outside.

mod engine;
mod state;

use std::fmt;

use thiserror::Error;

use crate::model::{BoxKind, Rectangle};

pub use engine::{AnnotationSession, DirectoryLoader};
pub use state::SessionState;

/// Navigation direction through the global crop sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Next => f.write_str("next"),
            Direction::Previous => f.write_str("previous"),
        }
    }
}

/// Phase of the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Fetching a probe directory's crops.
    Loading,
    /// A crop is current and accepts edits.
    Viewing,
    /// Flushing the working set into the overrides.
    Saving,
    /// Final state flushed; no further edits or navigation.
    Closed,
}

/// Errors surfaced by session operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No probe directory yielded any crops.
    #[error("No probe directory with usable crops")]
    NoDirectories,

    #[error("{kind} index {index} out of range (length {len})")]
    IndexOutOfRange {
        kind: BoxKind,
        index: usize,
        len: usize,
    },

    #[error("Degenerate rectangle {0}")]
    DegenerateRectangle(Rectangle),

    /// Navigation ran off the end of the data set. Not a failure.
    #[error("No more crops in {0} direction")]
    NoMoreTiles(Direction),

    #[error("Session is closed")]
    Closed,
}

/// Where the session currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub directory: String,
    pub directory_index: usize,
    pub directory_count: usize,
    pub tile_index: usize,
    pub tile_count: usize,
    pub tile_name: String,
}

impl Position {
    /// Session key of the current crop.
    pub fn tile_path(&self) -> String {
        crate::grid::tile_path(&self.directory, &self.tile_name)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [crop {}/{}, directory {}/{}]",
            self.tile_path(),
            self.tile_index + 1,
            self.tile_count,
            self.directory_index + 1,
            self.directory_count
        )
    }
}

/// Which navigation controls the front end should enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigation {
    pub can_go_next: bool,
    pub can_go_previous: bool,
}

impl Navigation {
    pub fn new(
        tile_index: usize,
        directory_index: usize,
        tile_count: usize,
        directory_count: usize,
    ) -> Self {
        Self {
            can_go_next: tile_index + 1 < tile_count || directory_index + 1 < directory_count,
            can_go_previous: tile_index > 0 || directory_index > 0,
        }
    }
}
