//! Annotation session state machine.

use std::collections::BTreeMap;

use ndarray::ArrayView2;

use crate::data::RasterSource;
use crate::grid::{DirectoryName, GridConfig, Tile, TiledRaster};
use crate::labels::{LabelSource, LabelTable};
use crate::model::{BoxKind, BoxSet, LabeledBox, Rectangle};
use crate::session::{Direction, Navigation, Position, SessionError, SessionPhase, SessionState};

/// A crop found by a navigation search, not yet made current.
struct Target {
    directory_index: usize,
    /// Set when the search crossed into another directory.
    tiles: Option<TiledRaster>,
    tile_index: usize,
}

/// Loads probe directories into crop grids, skipping the ones that cannot be used.
pub struct DirectoryLoader {
    rasters: Box<dyn RasterSource>,
    labels: Box<dyn LabelSource>,
    grid: GridConfig,
}

impl DirectoryLoader {
    pub fn new(
        rasters: Box<dyn RasterSource>,
        labels: Box<dyn LabelSource>,
        grid: GridConfig,
    ) -> Self {
        Self {
            rasters,
            labels,
            grid,
        }
    }

    /// Load a directory's crops, logging and returning None when it must be skipped.
    ///
    /// A missing label table only costs the existing boxes; a missing raster,
    /// a malformed name or an empty grid skip the directory.
    pub fn load(&self, directory: &str) -> Option<TiledRaster> {
        if let Err(e) = DirectoryName::parse(directory) {
            log::error!("Skipping directory: {}", e);
            return None;
        }

        let raster = match self.rasters.load_raster(directory) {
            Ok(raster) => raster,
            Err(e) => {
                log::warn!("Skipping directory {}: {}", directory, e);
                return None;
            }
        };

        let labels = self.labels.load_table(directory).unwrap_or_else(|e| {
            log::warn!("No existing boxes for {}: {}", directory, e);
            LabelTable::empty()
        });

        match TiledRaster::compute(raster, directory, &labels, &self.grid) {
            Ok(tiles) if tiles.is_empty() => {
                log::warn!("Skipping directory {}: raster smaller than one crop", directory);
                None
            }
            Ok(tiles) => Some(tiles),
            Err(e) => {
                log::error!("Skipping directory {}: {}", directory, e);
                None
            }
        }
    }

    /// First directory after `from` in `direction` that yields at least one crop.
    fn next_loadable(
        &self,
        directories: &[String],
        from: usize,
        direction: Direction,
    ) -> Option<(usize, TiledRaster)> {
        let mut index = from;
        loop {
            index = match direction {
                Direction::Next => Some(index + 1).filter(|&i| i < directories.len())?,
                Direction::Previous => index.checked_sub(1)?,
            };
            if let Some(tiles) = self.load(&directories[index]) {
                return Some((index, tiles));
            }
        }
    }
}

/// Interactive annotation session over an ordered list of probe directories.
///
/// The current crop's boxes live in a working set. Leaving a crop stores the
/// working set as that crop's override; coming back restores the override
/// instead of consulting the label table again.
pub struct AnnotationSession {
    directories: Vec<String>,
    directory_index: usize,
    tiles: TiledRaster,
    tile_index: usize,
    overrides: BTreeMap<String, BoxSet>,
    working: BoxSet,
    phase: SessionPhase,
    loader: DirectoryLoader,
}

impl AnnotationSession {
    /// Open a session over `directories` (already sorted), resuming from
    /// `resume` when given.
    ///
    /// A resume position naming an unknown directory or a crop past the end
    /// falls back to the start. If the starting directory cannot be opened,
    /// the first usable directory after it is used, or failing that the last
    /// crop of the nearest usable directory before it.
    pub fn open(
        directories: Vec<String>,
        resume: Option<SessionState>,
        rasters: Box<dyn RasterSource>,
        labels: Box<dyn LabelSource>,
        grid: GridConfig,
    ) -> Result<Self, SessionError> {
        if directories.is_empty() {
            return Err(SessionError::NoDirectories);
        }

        let (mut directory_index, mut tile_index, overrides) = match resume {
            Some(state) => {
                match directories
                    .iter()
                    .position(|d| *d == state.current_probe_directory)
                {
                    Some(index) => (index, state.current_crop_index, state.internal_boxes),
                    None => {
                        log::warn!(
                            "Saved directory '{}' no longer exists, starting from the beginning",
                            state.current_probe_directory
                        );
                        (0, 0, state.internal_boxes)
                    }
                }
            }
            None => (0, 0, BTreeMap::new()),
        };

        let loader = DirectoryLoader::new(rasters, labels, grid);

        let tiles = match loader.load(&directories[directory_index]) {
            Some(tiles) => tiles,
            None => {
                if let Some((index, tiles)) =
                    loader.next_loadable(&directories, directory_index, Direction::Next)
                {
                    directory_index = index;
                    tile_index = 0;
                    tiles
                } else {
                    // Nothing usable after the start; resume at the end of the
                    // closest usable directory before it.
                    let (index, tiles) = loader
                        .next_loadable(&directories, directory_index, Direction::Previous)
                        .ok_or(SessionError::NoDirectories)?;
                    directory_index = index;
                    tile_index = tiles.len() - 1;
                    tiles
                }
            }
        };

        if tile_index >= tiles.len() {
            log::warn!(
                "Saved crop index {} is past the end of {} ({} crops), starting at 0",
                tile_index,
                tiles.directory(),
                tiles.len()
            );
            tile_index = 0;
        }

        let mut session = Self {
            directories,
            directory_index,
            tiles,
            tile_index,
            overrides,
            working: BoxSet::default(),
            phase: SessionPhase::Loading,
            loader,
        };
        session.enter_tile();

        log::info!("Session opened at {}", session.position());
        Ok(session)
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn directories(&self) -> &[String] {
        &self.directories
    }

    pub fn position(&self) -> Position {
        Position {
            directory: self.tiles.directory().to_string(),
            directory_index: self.directory_index,
            directory_count: self.directories.len(),
            tile_index: self.tile_index,
            tile_count: self.tiles.len(),
            tile_name: self.current_tile().name.clone(),
        }
    }

    /// Enablement of the next/previous controls at the current position.
    pub fn navigation(&self) -> Navigation {
        Navigation::new(
            self.tile_index,
            self.directory_index,
            self.tiles.len(),
            self.directories.len(),
        )
    }

    pub fn current_tile(&self) -> &Tile {
        &self.tiles.tiles()[self.tile_index]
    }

    /// Session key of the current crop.
    pub fn current_tile_path(&self) -> String {
        crate::grid::tile_path(self.tiles.directory(), &self.current_tile().name)
    }

    /// Pixels of the current crop.
    pub fn current_crop(&self) -> Option<ArrayView2<'_, u16>> {
        self.tiles.crop(self.tile_index)
    }

    /// The live working set of the current crop.
    pub fn current_boxes(&self) -> &BoxSet {
        &self.working
    }

    /// Committed overrides of all visited crops.
    pub fn overrides(&self) -> &BTreeMap<String, BoxSet> {
        &self.overrides
    }

    /// Append a manual box to the current crop. Duplicates are allowed.
    pub fn add_manual_box(
        &mut self,
        rectangle: Rectangle,
        label: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.ensure_open()?;
        if rectangle.is_degenerate() {
            return Err(SessionError::DegenerateRectangle(rectangle));
        }

        let labeled = LabeledBox::new(rectangle, label);
        log::info!("Adding box at {} with label {}", labeled.rectangle, labeled.label);
        self.working.manual.push(labeled);
        Ok(())
    }

    pub fn delete_manual_box(&mut self, index: usize) -> Result<LabeledBox, SessionError> {
        self.delete_box(BoxKind::Manual, index)
    }

    /// Remove an existing box from this session's view of the crop.
    /// The label table itself is never modified.
    pub fn delete_existing_box(&mut self, index: usize) -> Result<LabeledBox, SessionError> {
        self.delete_box(BoxKind::Existing, index)
    }

    fn delete_box(&mut self, kind: BoxKind, index: usize) -> Result<LabeledBox, SessionError> {
        self.ensure_open()?;
        let len = self.working.get(kind).len();
        let removed = self
            .working
            .remove(kind, index)
            .ok_or(SessionError::IndexOutOfRange { kind, index, len })?;
        log::info!("Deleted {} box {}: {}", kind, index, removed);
        Ok(removed)
    }

    /// Store the working set as the current crop's override.
    pub fn commit_current(&mut self) {
        if self.phase == SessionPhase::Closed {
            return;
        }
        self.phase = SessionPhase::Saving;
        self.overrides
            .insert(self.current_tile_path(), self.working.clone());
        self.phase = SessionPhase::Viewing;
    }

    /// Move to the next non-blank crop in `direction`.
    ///
    /// Crossing the end of a directory continues in the adjacent directory,
    /// at its first crop going forward and its last crop going back.
    /// Directories that cannot be opened are skipped. Running off either end
    /// of the data set leaves the position unchanged and returns
    /// [`SessionError::NoMoreTiles`].
    pub fn advance(&mut self, direction: Direction) -> Result<Position, SessionError> {
        self.ensure_open()?;
        self.commit_current();

        self.phase = SessionPhase::Loading;
        let target = self.find_target(direction);
        self.phase = SessionPhase::Viewing;

        let Some(target) = target else {
            log::info!("No more crops in {} direction", direction);
            return Err(SessionError::NoMoreTiles(direction));
        };

        if let Some(tiles) = target.tiles {
            self.tiles = tiles;
            self.directory_index = target.directory_index;
        }
        self.tile_index = target.tile_index;
        self.enter_tile();

        let position = self.position();
        log::debug!("Moved {} to {}", direction, position);
        Ok(position)
    }

    /// Commit the working set and build the resumable state.
    pub fn snapshot(&mut self) -> SessionState {
        self.commit_current();
        self.state()
    }

    /// Resumable state from the committed overrides.
    pub fn state(&self) -> SessionState {
        SessionState {
            current_crop_index: self.tile_index,
            current_probe_directory: self.tiles.directory().to_string(),
            internal_boxes: self.overrides.clone(),
        }
    }

    /// Commit the working set and refuse further edits and navigation.
    pub fn close(&mut self) -> SessionState {
        let state = self.snapshot();
        self.phase = SessionPhase::Closed;
        log::info!("Session closed with {} visited crops", state.internal_boxes.len());
        state
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Closed => Err(SessionError::Closed),
            _ => Ok(()),
        }
    }

    /// Make the crop at `tile_index` current, restoring its override if it has one.
    fn enter_tile(&mut self) {
        let path = self.current_tile_path();
        self.working = match self.overrides.get(&path) {
            Some(boxes) => boxes.clone(),
            None => BoxSet::from_existing(self.current_tile().existing_boxes.clone()),
        };
        self.phase = SessionPhase::Viewing;
    }

    fn find_target(&self, direction: Direction) -> Option<Target> {
        let mut directory_index = self.directory_index;
        let mut loaded: Option<TiledRaster> = None;
        let mut tile_index = self.tile_index;

        loop {
            let current = loaded.as_ref().unwrap_or(&self.tiles);
            let stepped = match direction {
                Direction::Next => Some(tile_index + 1).filter(|&i| i < current.len()),
                Direction::Previous => tile_index.checked_sub(1),
            };

            tile_index = match stepped {
                Some(index) => index,
                None => {
                    let (index, tiles) = self
                        .loader
                        .next_loadable(&self.directories, directory_index, direction)?;
                    directory_index = index;
                    let entry = match direction {
                        Direction::Next => 0,
                        Direction::Previous => tiles.len() - 1,
                    };
                    loaded = Some(tiles);
                    entry
                }
            };

            let current = loaded.as_ref().unwrap_or(&self.tiles);
            if !current.is_blank(tile_index) {
                return Some(Target {
                    directory_index,
                    tiles: loaded,
                    tile_index,
                });
            }
            log::trace!(
                "Skipping blank crop {} of {}",
                tile_index,
                current.directory()
            );
        }
    }
}
