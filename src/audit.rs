//! Consistency checks over a processing root.
//!
//! Two checks catch data that would otherwise fail quietly during annotation:
//! crop files written with a different microscope monitor tag (their names
//! never match the generated ones, so they never get existing boxes), and
//! label values the vocabulary does not know about.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::labels::LabelSource;
use crate::layout::ProbeLayout;

/// A file under `<dir>/images` tagged with a foreign pmon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PmonMismatch {
    pub directory: String,
    pub file: PathBuf,
}

impl fmt::Display for PmonMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.directory, self.file.display())
    }
}

/// Find files whose name contains `pmon` but not the expected `pmon` tag.
///
/// Directories without an images subdirectory are skipped.
pub fn find_pmon_mismatches(
    layout: &ProbeLayout,
    directories: &[String],
    pmon: &str,
) -> io::Result<Vec<PmonMismatch>> {
    let mut mismatches = Vec::new();

    for directory in directories {
        let images = layout.images_dir(directory);
        let entries = match std::fs::read_dir(&images) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("No images directory in {}", directory);
                continue;
            }
            Err(e) => return Err(e),
        };

        let mut names = Vec::new();
        for entry in entries {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if name.contains("pmon") && !name.contains(pmon) {
                names.push(name);
            }
        }
        names.sort();

        if names.is_empty() {
            log::debug!("{} only has {} files", directory, pmon);
        }
        mismatches.extend(names.into_iter().map(|name| PmonMismatch {
            directory: directory.clone(),
            file: images.join(name),
        }));
    }

    Ok(mismatches)
}

/// Resolved labels found across the label tables of a processing root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSurvey {
    /// Occurrences of every resolved label.
    pub counts: BTreeMap<String, usize>,
    /// Per directory, the labels that are not in the vocabulary.
    pub unknown: BTreeMap<String, BTreeSet<String>>,
    /// Directories whose label table could not be read.
    pub unreadable: Vec<String>,
}

impl LabelSurvey {
    pub fn has_unknown_labels(&self) -> bool {
        !self.unknown.is_empty()
    }
}

/// Collect resolved labels from every directory's table and flag the ones
/// outside `vocabulary`.
pub fn survey_labels(
    source: &dyn LabelSource,
    directories: &[String],
    vocabulary: &[String],
) -> LabelSurvey {
    let known: BTreeSet<&str> = vocabulary.iter().map(String::as_str).collect();
    let mut survey = LabelSurvey::default();

    for directory in directories {
        let table = match source.load_table(directory) {
            Ok(table) => table,
            Err(e) => {
                log::warn!("Cannot survey {}: {}", directory, e);
                survey.unreadable.push(directory.clone());
                continue;
            }
        };

        for row in table.rows() {
            let label = row.resolved_label();
            *survey.counts.entry(label.to_string()).or_default() += 1;
            if !known.contains(label) {
                survey
                    .unknown
                    .entry(directory.clone())
                    .or_default()
                    .insert(label.to_string());
            }
        }

        if let Some(labels) = survey.unknown.get(directory) {
            log::warn!("Unknown labels in {}: {:?}", directory, labels);
        }
    }

    log::info!(
        "Surveyed {} directories, {} distinct labels",
        directories.len(),
        survey.counts.len()
    );
    survey
}
