//! Flattening visited crops' boxes into a CSV table.
//!
//! CSV columns:
//! - file_path: Session key of the crop (`<directory>/images/<crop name>`)
//! - x1, y1, x2, y2: Box corners in crop pixels
//! - label: Taxon label
//! - updated: `false` for boxes from the label table, `true` for manual boxes
//!
//! Only visited crops contribute rows. Within a crop, existing boxes come
//! before manual boxes; crops appear in key order.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::model::{BoxSet, LabeledBox};
use crate::session::SessionState;

/// Column names of the export table.
pub const EXPORT_HEADER: [&str; 7] = ["file_path", "x1", "y1", "x2", "y2", "label", "updated"];

/// Errors raised while writing an export.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// One box of one visited crop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub file_path: String,
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    pub label: String,
    pub updated: bool,
}

impl ExportRow {
    fn new(file_path: &str, labeled: &LabeledBox, updated: bool) -> Self {
        let rect = labeled.rectangle;
        Self {
            file_path: file_path.to_string(),
            x1: rect.x1,
            y1: rect.y1,
            x2: rect.x2,
            y2: rect.y2,
            label: labeled.label.clone(),
            updated,
        }
    }
}

/// Rows for every box of every visited crop.
pub fn export_rows(overrides: &BTreeMap<String, BoxSet>) -> Vec<ExportRow> {
    overrides
        .iter()
        .flat_map(|(path, boxes)| {
            let existing = boxes.existing.iter().map(|b| ExportRow::new(path, b, false));
            let manual = boxes.manual.iter().map(|b| ExportRow::new(path, b, true));
            existing.chain(manual)
        })
        .collect()
}

/// Rows for a persisted session state.
pub fn export_state(state: &SessionState) -> Vec<ExportRow> {
    export_rows(&state.internal_boxes)
}

/// Write rows as CSV. The header is written even when there are no rows.
pub fn write_csv<W: Write>(writer: W, rows: &[ExportRow]) -> ExportResult<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(EXPORT_HEADER)?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write rows to a CSV file.
pub fn write_csv_file(path: &Path, rows: &[ExportRow]) -> ExportResult<()> {
    let file = File::create(path)?;
    write_csv(BufWriter::new(file), rows)
}

/// Export a session state to a CSV file, returning the number of rows written.
pub fn export_csv(path: &Path, state: &SessionState) -> ExportResult<usize> {
    let rows = export_state(state);
    write_csv_file(path, &rows)?;
    log::info!(
        "Exported {} boxes from {} crops to {:?}",
        rows.len(),
        state.internal_boxes.len(),
        path
    );
    Ok(rows.len())
}
