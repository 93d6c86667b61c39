//! Pre-existing bounding boxes from the scanner's label tables.
//!
//! Each probe directory carries one table listing every object the scanner
//! detected. Crops are joined to rows by exact image name; the sentinel
//! policy in [`policy`] decides which column supplies the label.

pub mod policy;
mod table;

use std::path::PathBuf;

use thiserror::Error;

use crate::layout::ProbeLayout;
use crate::model::LabeledBox;

pub use table::{LabelRow, LabelTable};

/// Errors raised while reading a label table.
///
/// Callers treat both variants as "no existing boxes" for the directory.
#[derive(Error, Debug)]
pub enum LabelError {
    /// The table file is missing or unreadable.
    #[error("Label table unavailable at {path:?}: {source}")]
    LabelTableUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The table exists but could not be parsed.
    #[error("Malformed label table {path:?}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Supplies the label table of a probe directory.
pub trait LabelSource {
    fn load_table(&self, directory: &str) -> Result<LabelTable, LabelError>;

    /// Boxes recorded for one image of a directory, in table order.
    fn lookup(&self, directory: &str, image_name: &str) -> Result<Vec<LabeledBox>, LabelError> {
        Ok(self.load_table(directory)?.lookup(image_name))
    }
}

/// Reads `<root>/<dir>/csv/<dir>_01_class.csv`.
pub struct CsvLabelSource {
    layout: ProbeLayout,
}

impl CsvLabelSource {
    pub fn new(layout: ProbeLayout) -> Self {
        Self { layout }
    }
}

impl LabelSource for CsvLabelSource {
    fn load_table(&self, directory: &str) -> Result<LabelTable, LabelError> {
        LabelTable::load(&self.layout.label_table_path(directory))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_source_reads_directory_table() {
        let temp = tempfile::tempdir().unwrap();
        let layout = ProbeLayout::new(temp.path());
        let path = layout.label_table_path("d_1");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            "ImageName;x;y;Width;Height;PollenSpecies;PredictedPollenSpecies;PredictedPollenSpeciesLatin\n\
             t.tif;1;2;3;4;--;Corylus;Corylus avellana\n",
        )
        .unwrap();

        let source = CsvLabelSource::new(layout);
        let boxes = source.lookup("d_1", "t.tif").unwrap();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].label, "Corylus");
        assert!(matches!(
            source.lookup("d_2", "t.tif"),
            Err(LabelError::LabelTableUnavailable { .. })
        ));
    }
}
