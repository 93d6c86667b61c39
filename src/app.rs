//! The annotator application: a session wired to its store and configuration.
//!
//! Front ends talk to [`AnnotatorApp`] rather than to the session directly.
//! It persists after every navigation step, writes a backup on close, and
//! keeps manual labels within the configured vocabulary.

use std::path::Path;

use thiserror::Error;

use crate::config::AnnotatorConfig;
use crate::data::{FsRasterSource, RasterSource};
use crate::export::{ExportError, export_csv};
use crate::labels::{CsvLabelSource, LabelSource};
use crate::layout::ProbeLayout;
use crate::model::{LabeledBox, Rectangle};
use crate::persist::{SessionStore, StoreError};
use crate::session::{AnnotationSession, Direction, Position, SessionError, SessionState};

/// Errors surfaced to front ends.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Cannot list probe directories in {path:?}: {source}")]
    Discover {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Label '{0}' is not in the vocabulary")]
    UnknownLabel(String),
}

pub type AppResult<T> = Result<T, AppError>;

/// Outcome of a navigation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Moved(Position),
    /// Nothing left in that direction; state has been saved.
    EndOfData(Direction),
}

/// An open annotation session over one processing root.
pub struct AnnotatorApp {
    session: AnnotationSession,
    store: SessionStore,
    config: AnnotatorConfig,
}

impl AnnotatorApp {
    /// Open the processing root at `root`, resuming from its saved state.
    pub fn open(root: &Path, config: AnnotatorConfig) -> AppResult<Self> {
        let layout = ProbeLayout::new(root).with_backup_directory(&config.backup_directory);
        let directories = layout.discover().map_err(|source| AppError::Discover {
            path: root.to_path_buf(),
            source,
        })?;
        log::info!("Found {} probe directories in {:?}", directories.len(), root);

        let store = SessionStore::new(&layout)
            .with_file_name(&config.state_file_name)
            .with_backup_interval(config.backup_interval);

        Self::with_sources(
            directories,
            store,
            Box::new(FsRasterSource::new(layout.clone())),
            Box::new(CsvLabelSource::new(layout)),
            config,
        )
    }

    /// Open a session over explicit sources.
    pub fn with_sources(
        directories: Vec<String>,
        store: SessionStore,
        rasters: Box<dyn RasterSource>,
        labels: Box<dyn LabelSource>,
        config: AnnotatorConfig,
    ) -> AppResult<Self> {
        let resume = store.load_or_recover()?;
        let session =
            AnnotationSession::open(directories, resume, rasters, labels, config.grid.clone())?;
        Ok(Self {
            session,
            store,
            config,
        })
    }

    pub fn session(&self) -> &AnnotationSession {
        &self.session
    }

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Move one crop and persist.
    ///
    /// Running off the end of the data is reported as [`Step::EndOfData`]
    /// after the state has been saved.
    pub fn step(&mut self, direction: Direction) -> AppResult<Step> {
        let step = match self.session.advance(direction) {
            Ok(position) => Step::Moved(position),
            Err(SessionError::NoMoreTiles(direction)) => Step::EndOfData(direction),
            Err(e) => return Err(e.into()),
        };
        self.save()?;
        Ok(step)
    }

    /// Add a manual box to the current crop. The label must be in the vocabulary.
    pub fn add_box(&mut self, rectangle: Rectangle, label: &str) -> AppResult<()> {
        if !self.config.is_known_label(label) {
            return Err(AppError::UnknownLabel(label.to_string()));
        }
        self.session.add_manual_box(rectangle, label)?;
        Ok(())
    }

    pub fn delete_manual_box(&mut self, index: usize) -> AppResult<LabeledBox> {
        Ok(self.session.delete_manual_box(index)?)
    }

    pub fn delete_existing_box(&mut self, index: usize) -> AppResult<LabeledBox> {
        Ok(self.session.delete_existing_box(index)?)
    }

    /// Persist the current state.
    pub fn save(&mut self) -> AppResult<()> {
        let state = self.session.snapshot();
        self.store.save(&state)?;
        Ok(())
    }

    /// Export every visited crop's boxes, returning the number of rows.
    pub fn export(&mut self, path: &Path) -> AppResult<usize> {
        let state = self.session.snapshot();
        Ok(export_csv(path, &state)?)
    }

    /// Close the session, saving its final state with a backup.
    pub fn close(&mut self) -> AppResult<SessionState> {
        let state = self.session.close();
        self.store.save_with_backup(&state)?;
        log::info!("Saved final state to {:?}", self.store.path());
        Ok(state)
    }
}
