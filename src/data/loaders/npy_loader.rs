//! Loader for NumPy `.npy` files.
//!
//! Scans that were pre-processed in an analysis notebook are often stored as
//! plain NumPy arrays instead of TIFF.

use std::io::Cursor;

use ndarray::Array2;
use ndarray_npy::ReadNpyExt;

use crate::data::Raster;
use crate::data::loader::{LoaderError, RasterLoader};

/// Loader for NumPy `.npy` files.
///
/// **Expected array shape**: 2D `(rows, columns)`, dtype `u16` or `u8`.
/// `u8` data is widened to 16 bits.
pub struct NpyLoader;

impl NpyLoader {
    /// NumPy magic bytes: \x93NUMPY
    const MAGIC: &'static [u8] = &[0x93, b'N', b'U', b'M', b'P', b'Y'];
}

impl RasterLoader for NpyLoader {
    fn id(&self) -> &'static str {
        "npy"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["npy"]
    }

    fn sniff(&self, data: &[u8]) -> bool {
        data.starts_with(Self::MAGIC)
    }

    fn load(&self, data: &[u8]) -> Result<Raster, LoaderError> {
        if let Ok(array) = Array2::<u16>::read_npy(Cursor::new(data)) {
            log::debug!("NpyLoader: loaded u16 array of shape {:?}", array.dim());
            return Ok(array);
        }

        let array = Array2::<u8>::read_npy(Cursor::new(data))
            .map_err(|e| LoaderError::decode(self.id(), format!("Unsupported NumPy array: {e}")))?;
        log::debug!("NpyLoader: loaded u8 array of shape {:?}", array.dim());

        Ok(array.mapv(|v| u16::from(v) * 257))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_detection() {
        let loader = NpyLoader;
        assert!(loader.sniff(b"\x93NUMPY\x01\x00"));
        assert!(!loader.sniff(b"II*\x00\x08\x00\x00\x00"));
    }

    #[test]
    fn test_load_rejects_non_npy() {
        let err = NpyLoader.load(b"not a numpy file").unwrap_err();
        assert!(matches!(err, LoaderError::Decode { loader: "npy", .. }));
    }
}
