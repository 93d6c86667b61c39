//! Raster lookup for probe directories.

use std::path::PathBuf;

use thiserror::Error;

use crate::data::{LoaderRegistry, Raster};
use crate::layout::ProbeLayout;

/// The composite raster of a probe directory could not be produced.
#[derive(Error, Debug)]
pub enum RasterError {
    #[error("Raster unavailable at {path:?}: {reason}")]
    RasterUnavailable { path: PathBuf, reason: String },
}

/// Supplies the composite raster for a probe directory.
pub trait RasterSource {
    fn load_raster(&self, directory: &str) -> Result<Raster, RasterError>;
}

/// Reads `<root>/<dir>/images/<dir>_map.tif` and decodes it with a [`LoaderRegistry`].
pub struct FsRasterSource {
    layout: ProbeLayout,
    registry: LoaderRegistry,
}

impl FsRasterSource {
    pub fn new(layout: ProbeLayout) -> Self {
        Self {
            layout,
            registry: LoaderRegistry::new(),
        }
    }
}

impl RasterSource for FsRasterSource {
    fn load_raster(&self, directory: &str) -> Result<Raster, RasterError> {
        let path = self.layout.raster_path(directory);
        let unavailable = |reason: String| RasterError::RasterUnavailable {
            path: path.clone(),
            reason,
        };

        let bytes = std::fs::read(&path).map_err(|e| unavailable(e.to_string()))?;
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        let raster = self
            .registry
            .load(&bytes, &name)
            .map_err(|e| unavailable(e.to_string()))?;

        log::debug!(
            "Loaded raster {:?} ({} rows x {} columns)",
            path,
            raster.nrows(),
            raster.ncols()
        );
        Ok(raster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_raster_is_unavailable() {
        let temp = tempfile::tempdir().unwrap();
        let source = FsRasterSource::new(ProbeLayout::new(temp.path()));

        let err = source.load_raster("20180430_A050570").unwrap_err();
        let RasterError::RasterUnavailable { path, .. } = err;
        assert!(path.ends_with("images/20180430_A050570_map.tif"));
    }

    #[test]
    fn test_loads_png_content_under_tif_name() {
        let temp = tempfile::tempdir().unwrap();
        let layout = ProbeLayout::new(temp.path());
        std::fs::create_dir_all(layout.images_dir("d_1")).unwrap();

        let gray = image::GrayImage::from_pixel(6, 4, image::Luma([7]));
        gray.save_with_format(layout.raster_path("d_1"), image::ImageFormat::Png)
            .unwrap();

        let raster = FsRasterSource::new(layout).load_raster("d_1").unwrap();
        assert_eq!(raster.dim(), (4, 6));
    }
}
