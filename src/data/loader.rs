//! Decoding composite slide scans into rasters.
//!
//! Scanners export the stitched probe map as TIFF, but maps re-saved by other
//! tools may be PNG or NumPy arrays under the same `_map.tif` name. Each
//! format is handled by a [`RasterLoader`]; the [`LoaderRegistry`] picks one
//! by file extension and falls back to sniffing the leading bytes.

use thiserror::Error;

use crate::data::Raster;
use crate::data::loaders::{ImageLoader, NpyLoader};

/// A raster file could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoaderError {
    #[error("[{loader}] {message}")]
    Decode {
        loader: &'static str,
        message: String,
    },

    #[error("No loader could decode {name}")]
    Undecodable { name: String },
}

impl LoaderError {
    pub(crate) fn decode(loader: &'static str, message: impl std::fmt::Display) -> Self {
        Self::Decode {
            loader,
            message: message.to_string(),
        }
    }
}

/// One raster file format.
pub trait RasterLoader: Send + Sync {
    /// Short name used in log and error messages.
    fn id(&self) -> &'static str;

    /// Lowercase file extensions, without the dot.
    fn extensions(&self) -> &'static [&'static str];

    /// Whether `data` starts with this format's signature.
    fn sniff(&self, data: &[u8]) -> bool;

    /// Decode to a grayscale raster of shape (rows, columns).
    fn load(&self, data: &[u8]) -> Result<Raster, LoaderError>;
}

/// The loaders available to a raster source.
pub struct LoaderRegistry {
    loaders: Vec<Box<dyn RasterLoader>>,
}

impl LoaderRegistry {
    /// A registry with the NumPy and image loaders.
    pub fn new() -> Self {
        Self::empty()
            .with_loader(Box::new(NpyLoader))
            .with_loader(Box::new(ImageLoader))
    }

    pub fn empty() -> Self {
        Self {
            loaders: Vec::new(),
        }
    }

    /// Add a loader. Earlier loaders win when several claim a file.
    pub fn with_loader(mut self, loader: Box<dyn RasterLoader>) -> Self {
        self.loaders.push(loader);
        self
    }

    /// Loaders to try for `data` named `name`: extension matches first,
    /// then loaders whose signature matches.
    fn candidates<'a>(&'a self, data: &[u8], name: &str) -> Vec<&'a dyn RasterLoader> {
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        let by_extension = self
            .loaders
            .iter()
            .filter(|l| l.extensions().iter().any(|e| *e == extension));
        let by_signature = self.loaders.iter().filter(|l| l.sniff(data));

        let mut candidates: Vec<&dyn RasterLoader> = Vec::new();
        for loader in by_extension.chain(by_signature) {
            if !candidates.iter().any(|c| c.id() == loader.id()) {
                candidates.push(loader.as_ref());
            }
        }
        candidates
    }

    /// Decode `data`, read from a file called `name`.
    pub fn load(&self, data: &[u8], name: &str) -> Result<Raster, LoaderError> {
        for loader in self.candidates(data, name) {
            match loader.load(data) {
                Ok(raster) => {
                    log::debug!("Decoded {} with the {} loader", name, loader.id());
                    return Ok(raster);
                }
                Err(e) => log::trace!("{}", e),
            }
        }
        Err(LoaderError::Undecodable {
            name: name.to_string(),
        })
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let gray = image::GrayImage::from_pixel(3, 2, image::Luma([1]));
        let mut bytes = Vec::new();
        gray.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_extension_is_tried_before_signature() {
        let registry = LoaderRegistry::new();
        let order: Vec<_> = registry
            .candidates(&png_bytes(), "map.NPY")
            .iter()
            .map(|l| l.id())
            .collect();
        assert_eq!(order, ["npy", "image"]);
    }

    #[test]
    fn test_signature_rescues_wrong_extension() {
        let raster = LoaderRegistry::new()
            .load(&png_bytes(), "20180430_A1_map.tif")
            .unwrap();
        assert_eq!(raster.dim(), (2, 3));
    }

    #[test]
    fn test_load_garbage_fails() {
        let err = LoaderRegistry::new()
            .load(&[0x00, 0x01, 0x02, 0x03], "broken.tif")
            .unwrap_err();
        assert_eq!(
            err,
            LoaderError::Undecodable {
                name: "broken.tif".to_string()
            }
        );
    }

    #[test]
    fn test_empty_registry_decodes_nothing() {
        assert!(LoaderRegistry::empty().load(&png_bytes(), "a.png").is_err());
    }
}
