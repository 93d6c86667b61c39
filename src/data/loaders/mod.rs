//! Built-in raster loaders.
//!
//! This module contains implementations of the `RasterLoader` trait
//! for the file formats slide scanners produce.

mod image_loader;
mod npy_loader;

pub use image_loader::ImageLoader;
pub use npy_loader::NpyLoader;
