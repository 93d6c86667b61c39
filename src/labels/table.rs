//! Semicolon-delimited label tables exported by the slide scanner.
//!
//! One row per detected object. Columns used here:
//! `ImageName;x;y;Width;Height;PollenSpecies;PredictedPollenSpecies;PredictedPollenSpeciesLatin`.
//! Any other columns are ignored.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::labels::LabelError;
use crate::labels::policy::{LabelField, resolve_field};
use crate::model::{LabeledBox, Rectangle};

/// A single row of a label table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LabelRow {
    #[serde(rename = "ImageName")]
    pub image_name: String,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "Width")]
    pub width: f64,
    #[serde(rename = "Height")]
    pub height: f64,
    #[serde(rename = "PollenSpecies", default)]
    pub species: String,
    #[serde(rename = "PredictedPollenSpecies", default)]
    pub predicted_species: String,
    #[serde(rename = "PredictedPollenSpeciesLatin", default)]
    pub predicted_species_latin: String,
}

impl LabelRow {
    fn field(&self, field: LabelField) -> &str {
        match field {
            LabelField::Species => &self.species,
            LabelField::PredictedSpecies => &self.predicted_species,
            LabelField::PredictedSpeciesLatin => &self.predicted_species_latin,
        }
    }

    /// Label after applying the sentinel policy to the primary species column.
    pub fn resolved_label(&self) -> &str {
        self.field(resolve_field(&self.species))
    }

    /// `(x, y, x + Width, y + Height)`. Corners are summed before truncating
    /// to whole pixels.
    pub fn rectangle(&self) -> Rectangle {
        Rectangle::new(
            self.x as i32,
            self.y as i32,
            (self.x + self.width) as i32,
            (self.y + self.height) as i32,
        )
    }

    pub fn to_labeled_box(&self) -> LabeledBox {
        LabeledBox::new(self.rectangle(), self.resolved_label())
    }
}

/// All rows of one probe directory's label table, in file order.
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    rows: Vec<LabelRow>,
}

impl LabelTable {
    /// A table without rows; every lookup yields no boxes.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<LabelRow>) -> Self {
        Self { rows }
    }

    /// Read a table from a file.
    pub fn load(path: &Path) -> Result<Self, LabelError> {
        let file = File::open(path).map_err(|source| LabelError::LabelTableUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::read(BufReader::new(file), path)
    }

    /// Read a table from CSV text.
    ///
    /// Useful for testing without file I/O.
    pub fn from_csv_str(csv: &str) -> Result<Self, LabelError> {
        Self::read(csv.as_bytes(), Path::new("<string>"))
    }

    fn read<R: Read>(reader: R, path: &Path) -> Result<Self, LabelError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let mut rows = Vec::new();
        for result in csv_reader.deserialize() {
            let row: LabelRow = result.map_err(|source| LabelError::Malformed {
                path: PathBuf::from(path),
                source,
            })?;
            rows.push(row);
        }

        log::debug!("Read {} label rows from {:?}", rows.len(), path);
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[LabelRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Boxes recorded for exactly this image name, in table order.
    pub fn lookup(&self, image_name: &str) -> Vec<LabeledBox> {
        self.rows
            .iter()
            .filter(|row| row.image_name == image_name)
            .map(LabelRow::to_labeled_box)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "no;ImageName;x;y;Width;Height;PollenSpecies;PredictedPollenSpecies;PredictedPollenSpeciesLatin";

    fn table(rows: &[&str]) -> LabelTable {
        let mut csv = String::from(HEADER);
        for row in rows {
            csv.push('\n');
            csv.push_str(row);
        }
        LabelTable::from_csv_str(&csv).unwrap()
    }

    #[test]
    fn test_label_resolution() {
        let table = table(&[
            "1;a.tif;0;0;1;1;--;Pinus;X",
            "2;a.tif;0;0;1;1;Y;Kiefer;Quercus",
            "3;a.tif;0;0;1;1;Betula;Pinus;Quercus",
        ]);
        let labels: Vec<_> = table.lookup("a.tif").into_iter().map(|b| b.label).collect();
        assert_eq!(labels, vec!["Pinus", "Quercus", "Betula"]);
    }

    #[test]
    fn test_substitution_does_not_cascade() {
        // The predicted column holds another sentinel; it is used verbatim.
        let table = table(&["1;a.tif;0;0;1;1;--;Y;Quercus"]);
        assert_eq!(table.lookup("a.tif")[0].label, "Y");
    }

    #[test]
    fn test_lookup_exact_match_in_table_order() {
        let table = table(&[
            "1;b.tif;10;20;5;6;Alnus;;",
            "2;a.tif;0;0;1;1;Fagus;;",
            "3;b.tif;1;2;3;4;Salix;;",
            "4;b.tif.bak;1;2;3;4;Taxus;;",
        ]);

        let boxes = table.lookup("b.tif");
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0], LabeledBox::new(Rectangle::new(10, 20, 15, 26), "Alnus"));
        assert_eq!(boxes[1], LabeledBox::new(Rectangle::new(1, 2, 4, 6), "Salix"));
        assert!(table.lookup("missing.tif").is_empty());
    }

    #[test]
    fn test_fractional_coordinates_truncate() {
        // 10.7 + 5.9 = 16.6 and 20.2 + 6.9 = 27.1
        let table = table(&["1;a.tif;10.7;20.2;5.9;6.9;Alnus;;"]);
        assert_eq!(table.lookup("a.tif")[0].rectangle, Rectangle::new(10, 20, 16, 27));
    }

    #[test]
    fn test_missing_optional_columns() {
        let table = LabelTable::from_csv_str("ImageName;x;y;Width;Height\na.tif;1;1;2;2").unwrap();
        assert_eq!(table.lookup("a.tif")[0].label, "");
    }

    #[test]
    fn test_malformed_table() {
        let err = LabelTable::from_csv_str("ImageName;x;y;Width;Height\na.tif;one;1;2;2").unwrap_err();
        assert!(matches!(err, LabelError::Malformed { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = LabelTable::load(Path::new("/nonexistent/table.csv")).unwrap_err();
        assert!(matches!(err, LabelError::LabelTableUnavailable { .. }));
    }
}
