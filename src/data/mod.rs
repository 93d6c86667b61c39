//! Raster data and loaders for composite slide scans.
//!
//! This module provides:
//! - `Raster`: a 2D grayscale pixel array, rows × columns
//! - `LoaderRegistry`: extensible system for decoding raster files
//! - `RasterSource`: resolves the composite raster of a probe directory
//!
//! ## Adding New Formats
//!
//! 1. Create a new loader in `loaders/` implementing `RasterLoader`
//! 2. Add it in `LoaderRegistry::new()`

mod loader;
pub mod loaders;
mod source;

pub use loader::{LoaderError, LoaderRegistry, RasterLoader};
pub use source::{FsRasterSource, RasterError, RasterSource};

/// Grayscale raster, indexed `[row, column]`.
pub type Raster = ndarray::Array2<u16>;
