//! Loader for standard image formats (TIFF, PNG, JPEG, BMP).
//!
//! Decodes to a single 16-bit grayscale band.

use ndarray::Array2;

use crate::data::Raster;
use crate::data::loader::{LoaderError, RasterLoader};

/// Loader for standard image formats.
///
/// Color images are converted to luminance; 8-bit images are widened to 16 bits.
pub struct ImageLoader;

/// Leading bytes of TIFF (both byte orders), PNG, JPEG and BMP files.
const SIGNATURES: [&[u8]; 5] = [
    b"II*\0",
    b"MM\0*",
    b"\x89PNG\r\n\x1a\n",
    b"\xFF\xD8\xFF",
    b"BM",
];

impl RasterLoader for ImageLoader {
    fn id(&self) -> &'static str {
        "image"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["tif", "tiff", "png", "jpg", "jpeg", "bmp"]
    }

    fn sniff(&self, data: &[u8]) -> bool {
        SIGNATURES.iter().any(|signature| data.starts_with(signature))
    }

    fn load(&self, data: &[u8]) -> Result<Raster, LoaderError> {
        let img = image::load_from_memory(data)
            .map_err(|e| LoaderError::decode(self.id(), e))?
            .to_luma16();

        let width = img.width() as usize;
        let height = img.height() as usize;

        let raster = Array2::from_shape_vec((height, width), img.into_raw())
            .map_err(|e| LoaderError::decode(self.id(), e))?;

        log::trace!("ImageLoader: loaded {}x{} raster", width, height);

        Ok(raster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode_png(image: &image::GrayImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_magic_detection_tiff() {
        let loader = ImageLoader;
        let tiff_le = [0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00];
        let tiff_be = [0x4D, 0x4D, 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08];
        assert!(loader.sniff(&tiff_le));
        assert!(loader.sniff(&tiff_be));
    }

    #[test]
    fn test_magic_detection_other_formats() {
        let loader = ImageLoader;
        assert!(loader.sniff(b"\xFF\xD8\xFF\xE0"));
        assert!(!loader.sniff(b"\x93NUMPY"));
        assert!(!loader.sniff(&[0x00, 0x01, 0x02]));
    }

    #[test]
    fn test_load_png_shape_is_rows_by_columns() {
        let gray = image::GrayImage::from_fn(4, 3, |x, y| image::Luma([(x + 10 * y) as u8]));
        let raster = ImageLoader.load(&encode_png(&gray)).unwrap();

        assert_eq!(raster.dim(), (3, 4));
        // 8-bit values are widened by a factor of 257
        assert_eq!(raster[[0, 0]], 0);
        assert_eq!(raster[[2, 1]], 21 * 257);
    }
}
