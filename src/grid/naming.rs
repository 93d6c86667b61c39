//! Crop names derived from probe directory metadata and grid labels.
//!
//! A crop at horizontal label 5, vertical label 22 of directory
//! `20180430030003_A050570` is called
//! `polle-im_01_05_22-20180430030003-pmon-00013-A050570-tiffRAW.png`
//! for display, and `...-tiff.tif` in the label table.

use crate::grid::GridError;

/// Image variants sharing one crop name stem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    /// Raw crop shown to the operator.
    Raw,
    /// Synthetic focus-stacked variant produced by the scanner.
    Synthetic,
    /// Source tiff name, the join key into the label table.
    Tif,
}

impl ImageType {
    pub fn suffix(&self) -> &'static str {
        match self {
            ImageType::Raw => "RAW.png",
            ImageType::Synthetic => "FAST.SYN._FP.png",
            ImageType::Tif => ".tif",
        }
    }
}

/// A probe directory name split into its `<date>_<probe>` parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryName<'a> {
    pub date: &'a str,
    pub probe: &'a str,
}

impl<'a> DirectoryName<'a> {
    /// Split a directory name on its single underscore.
    pub fn parse(name: &'a str) -> Result<Self, GridError> {
        let mut parts = name.split('_');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(date), Some(probe), None) => Ok(Self { date, probe }),
            _ => Err(GridError::MalformedDirectoryName {
                name: name.to_string(),
            }),
        }
    }

    /// Name of the crop at the given grid labels.
    pub fn tile_name(
        &self,
        horizontal_label: i32,
        vertical_label: i32,
        image_type: ImageType,
        pmon: &str,
    ) -> String {
        format!(
            "polle-im_01_{:02}_{:02}-{}-{}-{}-tiff{}",
            horizontal_label,
            vertical_label,
            self.date,
            pmon,
            self.probe,
            image_type.suffix()
        )
    }
}

/// Unique key of a crop across the whole processing root.
pub fn tile_path(directory: &str, tile_name: &str) -> String {
    format!("{}/{}/{}", directory, crate::constants::IMAGES_DIRECTORY, tile_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PMON;

    #[test]
    fn test_parse_directory_name() {
        let name = DirectoryName::parse("20180430030003_A050570").unwrap();
        assert_eq!(name.date, "20180430030003");
        assert_eq!(name.probe, "A050570");
    }

    #[test]
    fn test_parse_rejects_wrong_underscore_count() {
        for bad in ["20180430030003", "2018_04_30", "a_b_"] {
            let err = DirectoryName::parse(bad).unwrap_err();
            assert!(matches!(err, GridError::MalformedDirectoryName { .. }), "{bad}");
        }
    }

    #[test]
    fn test_tile_names() {
        let name = DirectoryName::parse("20180430030003_A050570").unwrap();
        assert_eq!(
            name.tile_name(5, 22, ImageType::Raw, PMON),
            "polle-im_01_05_22-20180430030003-pmon-00013-A050570-tiffRAW.png"
        );
        assert_eq!(
            name.tile_name(12, 3, ImageType::Tif, PMON),
            "polle-im_01_12_03-20180430030003-pmon-00013-A050570-tiff.tif"
        );
        assert_eq!(
            name.tile_name(1, 23, ImageType::Synthetic, PMON),
            "polle-im_01_01_23-20180430030003-pmon-00013-A050570-tiffFAST.SYN._FP.png"
        );
    }

    #[test]
    fn test_tile_path() {
        assert_eq!(tile_path("d1", "t1"), "d1/images/t1");
    }
}
