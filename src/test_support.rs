//! In-memory raster and label sources for tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use ndarray::{Array2, Axis, Slice};

use crate::data::{Raster, RasterError, RasterSource};
use crate::grid::{GridConfig, LabelEnd};
use crate::labels::{LabelError, LabelSource, LabelTable};

pub const TILE_WIDTH: usize = 4;
pub const TILE_HEIGHT: usize = 3;

/// 4 x 3 crops with the grid-width label policy.
pub fn grid() -> GridConfig {
    GridConfig {
        tile_width: TILE_WIDTH,
        tile_height: TILE_HEIGHT,
        label_end: LabelEnd::GridWidth,
        ..GridConfig::default()
    }
}

/// One row of `columns` crops, none of them blank.
///
/// Presentation index `i` is column `columns - 1 - i`.
pub fn row_raster(columns: usize) -> Raster {
    Array2::from_shape_fn((TILE_HEIGHT, TILE_WIDTH * columns), |(r, c)| {
        (r * TILE_WIDTH + c % TILE_WIDTH) as u16 + 1
    })
}

/// Like [`row_raster`], with the crops at the given presentation indices blank.
pub fn row_raster_with_blanks(columns: usize, blank: &[usize]) -> Raster {
    let mut raster = row_raster(columns);
    for &index in blank {
        let column = columns - 1 - index;
        raster
            .slice_axis_mut(Axis(1), Slice::from(column * TILE_WIDTH..(column + 1) * TILE_WIDTH))
            .fill(0);
    }
    raster
}

/// Rasters keyed by directory name; unknown directories are unavailable.
#[derive(Default)]
pub struct MemoryRasters {
    rasters: HashMap<String, Raster>,
}

impl MemoryRasters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, directory: &str, raster: Raster) -> Self {
        self.rasters.insert(directory.to_string(), raster);
        self
    }
}

impl RasterSource for MemoryRasters {
    fn load_raster(&self, directory: &str) -> Result<Raster, RasterError> {
        self.rasters
            .get(directory)
            .cloned()
            .ok_or_else(|| RasterError::RasterUnavailable {
                path: PathBuf::from(directory),
                reason: "not in memory".to_string(),
            })
    }
}

/// Label tables keyed by directory name, shared so a test can change them
/// after handing the source to a session.
#[derive(Default, Clone)]
pub struct MemoryLabels {
    tables: Rc<RefCell<HashMap<String, LabelTable>>>,
}

impl MemoryLabels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a directory's table with the given semicolon-separated body rows.
    pub fn set(&self, directory: &str, rows: &[&str]) {
        let mut csv = String::from(
            "ImageName;x;y;Width;Height;PollenSpecies;PredictedPollenSpecies;PredictedPollenSpeciesLatin",
        );
        for row in rows {
            csv.push('\n');
            csv.push_str(row);
        }
        let table = LabelTable::from_csv_str(&csv).unwrap();
        self.tables.borrow_mut().insert(directory.to_string(), table);
    }
}

impl LabelSource for MemoryLabels {
    fn load_table(&self, directory: &str) -> Result<LabelTable, LabelError> {
        self.tables
            .borrow()
            .get(directory)
            .cloned()
            .ok_or_else(|| LabelError::LabelTableUnavailable {
                path: PathBuf::from(directory),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not in memory"),
            })
    }
}
