//! Crop grid over a probe directory's composite raster.
//!
//! The scanner stitches every field of view of a slide into one large map.
//! This module cuts the map back into fixed-size crops, names each crop the
//! way the scanner named the original field, and attaches the boxes the
//! scanner recorded for it.

mod crop;
pub mod naming;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{PMON, TILE_HEIGHT, TILE_WIDTH, TOP_VERTICAL_LABEL};

pub use crop::{GridCell, Tile, TiledRaster, generation_order, presentation_order};
pub use naming::{DirectoryName, ImageType, tile_path};

/// Errors raised while cutting a raster into crops.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// Directory names must be `<date>_<probe>` with exactly one underscore.
    #[error("Malformed probe directory name '{name}': expected <date>_<probe>")]
    MalformedDirectoryName { name: String },

    #[error("Invalid tile size {width}x{height}")]
    InvalidTileSize { width: usize, height: usize },
}

/// Where the horizontal labels of a directory start counting down from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "policy", content = "value")]
pub enum LabelEnd {
    /// Number of crop columns, so the right-most column is labelled 1.
    #[default]
    GridWidth,
    /// The same value for every directory.
    Fixed(i32),
}

/// Geometry and naming parameters of the crop grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_tile_width")]
    pub tile_width: usize,

    #[serde(default = "default_tile_height")]
    pub tile_height: usize,

    /// Vertical label of the top crop row
    #[serde(default = "default_top_vertical_label")]
    pub top_vertical_label: i32,

    #[serde(default)]
    pub label_end: LabelEnd,

    /// Per-directory label ends, taking precedence over `label_end`
    #[serde(default)]
    pub label_end_overrides: BTreeMap<String, i32>,

    #[serde(default = "default_pmon")]
    pub pmon: String,
}

fn default_tile_width() -> usize {
    TILE_WIDTH
}

fn default_tile_height() -> usize {
    TILE_HEIGHT
}

fn default_top_vertical_label() -> i32 {
    TOP_VERTICAL_LABEL
}

fn default_pmon() -> String {
    PMON.to_string()
}

impl GridConfig {
    /// Label end of `directory` given its number of crop columns.
    pub fn label_end_for(&self, directory: &str, horizontal_tiles: usize) -> i32 {
        if let Some(&end) = self.label_end_overrides.get(directory) {
            return end;
        }
        match self.label_end {
            LabelEnd::GridWidth => horizontal_tiles as i32,
            LabelEnd::Fixed(end) => end,
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            tile_width: default_tile_width(),
            tile_height: default_tile_height(),
            top_vertical_label: default_top_vertical_label(),
            label_end: LabelEnd::default(),
            label_end_overrides: BTreeMap::new(),
            pmon: default_pmon(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_end_policies() {
        let mut config = GridConfig::default();
        assert_eq!(config.label_end_for("d_1", 7), 7);

        config.label_end = LabelEnd::Fixed(12);
        assert_eq!(config.label_end_for("d_1", 7), 12);

        config.label_end_overrides.insert("d_2".to_string(), 30);
        assert_eq!(config.label_end_for("d_2", 7), 30);
        assert_eq!(config.label_end_for("d_1", 7), 12);
    }

    #[test]
    fn test_config_defaults_from_empty_json() {
        let config: GridConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, GridConfig::default());
        assert_eq!(config.tile_width, 1280);
        assert_eq!(config.tile_height, 960);
        assert_eq!(config.top_vertical_label, 23);
    }

    #[test]
    fn test_label_end_json() {
        let fixed: LabelEnd = serde_json::from_str(r#"{"policy":"fixed","value":17}"#).unwrap();
        assert_eq!(fixed, LabelEnd::Fixed(17));
        let width: LabelEnd = serde_json::from_str(r#"{"policy":"grid_width"}"#).unwrap();
        assert_eq!(width, LabelEnd::GridWidth);
    }
}
