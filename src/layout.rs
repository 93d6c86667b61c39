//! On-disk layout of a processing root.
//!
//! ```text
//! <root>/
//!   saved_state.json
//!   backups/
//!   <date>_<probe>/
//!     images/<date>_<probe>_map.tif
//!     csv/<date>_<probe>_01_class.csv
//! ```

use std::io;
use std::path::{Path, PathBuf};

use crate::constants::{BACKUP_DIRECTORY, CSV_DIRECTORY, IMAGES_DIRECTORY};

/// Resolves probe directory paths below a processing root.
#[derive(Debug, Clone)]
pub struct ProbeLayout {
    root: PathBuf,
    backup_directory: String,
}

impl ProbeLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            backup_directory: BACKUP_DIRECTORY.to_string(),
        }
    }

    /// Use a different name for the backups subdirectory.
    pub fn with_backup_directory(mut self, name: impl Into<String>) -> Self {
        self.backup_directory = name.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.root.join(&self.backup_directory)
    }

    pub fn images_dir(&self, directory: &str) -> PathBuf {
        self.root.join(directory).join(IMAGES_DIRECTORY)
    }

    /// Composite raster of a probe directory.
    pub fn raster_path(&self, directory: &str) -> PathBuf {
        self.images_dir(directory)
            .join(format!("{}_map.tif", directory))
    }

    /// Semicolon-delimited label table of a probe directory.
    pub fn label_table_path(&self, directory: &str) -> PathBuf {
        self.root
            .join(directory)
            .join(CSV_DIRECTORY)
            .join(format!("{}_01_class.csv", directory))
    }

    /// List the probe directories in navigation order.
    ///
    /// Every subdirectory of the root except the backups directory, sorted by name.
    pub fn discover(&self) -> io::Result<Vec<String>> {
        let mut directories = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                log::warn!("Skipping non UTF-8 directory name {:?}", entry.file_name());
                continue;
            };
            if name == self.backup_directory {
                continue;
            }
            directories.push(name);
        }
        directories.sort();
        log::debug!("Discovered {} probe directories in {:?}", directories.len(), self.root);
        Ok(directories)
    }
}
