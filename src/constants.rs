//! Global constants for the pollen annotator

/// Width of one crop in pixels
pub const TILE_WIDTH: usize = 1280;

/// Height of one crop in pixels
pub const TILE_HEIGHT: usize = 960;

/// Vertical grid label of the top row; labels count down from here.
pub const TOP_VERTICAL_LABEL: i32 = 23;

/// Microscope monitor tag embedded in every crop name.
pub const PMON: &str = "pmon-00013";

/// Name of the persisted session file inside the processing root.
pub const STATE_FILE_NAME: &str = "saved_state.json";

/// Subdirectory of the processing root that holds backup snapshots.
pub const BACKUP_DIRECTORY: &str = "backups";

/// Every n-th save also copies the file it just wrote into the backups.
pub const BACKUP_INTERVAL: u64 = 100;

/// Subdirectory of a probe directory holding the composite raster.
pub const IMAGES_DIRECTORY: &str = "images";

/// Subdirectory of a probe directory holding the label table.
pub const CSV_DIRECTORY: &str = "csv";
