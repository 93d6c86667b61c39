//! The session store: atomic saves, periodic backups, corrupt-file quarantine.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use web_time::{SystemTime, UNIX_EPOCH};

use crate::constants::{BACKUP_INTERVAL, STATE_FILE_NAME};
use crate::layout::ProbeLayout;
use crate::persist::{StoreError, StoreResult};
use crate::session::SessionState;

/// Reads and writes the session file of one processing root.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    backup_dir: PathBuf,
    /// Every n-th save also writes a backup; 0 disables periodic backups.
    backup_interval: u64,
    save_count: u64,
}

impl SessionStore {
    /// Store at `<root>/saved_state.json` with backups in the layout's backup directory.
    pub fn new(layout: &ProbeLayout) -> Self {
        Self {
            path: layout.root().join(STATE_FILE_NAME),
            backup_dir: layout.backup_dir(),
            backup_interval: BACKUP_INTERVAL,
            save_count: 0,
        }
    }

    pub fn with_file_name(mut self, file_name: &str) -> Self {
        self.path.set_file_name(file_name);
        self
    }

    pub fn with_backup_interval(mut self, interval: u64) -> Self {
        self.backup_interval = interval;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Saves performed through this store since it was created.
    pub fn save_count(&self) -> u64 {
        self.save_count
    }

    /// Persist `state`, adding a backup on every n-th save.
    pub fn save(&mut self, state: &SessionState) -> StoreResult<()> {
        self.save_count += 1;
        let periodic =
            self.backup_interval > 0 && self.save_count % self.backup_interval == 0;
        self.write(state)?;
        if periodic {
            self.backup()?;
        }
        Ok(())
    }

    /// Persist `state` and always add a backup of it.
    pub fn save_with_backup(&mut self, state: &SessionState) -> StoreResult<()> {
        self.save_count += 1;
        self.write(state)?;
        self.backup()?;
        Ok(())
    }

    /// Read the persisted state.
    ///
    /// Returns `Ok(None)` when no state file exists yet.
    pub fn load(&self) -> StoreResult<Option<SessionState>> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("No saved state at {:?}", self.path);
                return Ok(None);
            }
            Err(e) => return Err(self.corrupt(e.to_string())),
        };

        let state: SessionState =
            serde_json::from_str(&json).map_err(|e| self.corrupt(e.to_string()))?;
        log::info!(
            "Loaded saved state from {:?}: {} at crop {}, {} visited crops",
            self.path,
            state.current_probe_directory,
            state.current_crop_index,
            state.internal_boxes.len()
        );
        Ok(Some(state))
    }

    /// Like [`load`](Self::load), but a corrupt file is moved into the backup
    /// directory and treated as absent.
    pub fn load_or_recover(&self) -> StoreResult<Option<SessionState>> {
        match self.load() {
            Err(StoreError::PersistedStateCorrupt { path, reason }) => {
                log::error!("Saved state {:?} is unreadable: {}", path, reason);
                let moved = self.quarantine()?;
                log::error!("Moved it to {:?} and starting from a fresh session", moved);
                Ok(None)
            }
            other => other,
        }
    }

    /// Copy the current state file into the backup directory.
    ///
    /// Returns the backup path, or None if there is no state file yet.
    pub fn backup(&self) -> StoreResult<Option<PathBuf>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let target = self.backup_target("")?;
        fs::copy(&self.path, &target)?;
        log::info!("Backed up session state to {:?}", target);
        Ok(Some(target))
    }

    /// Backups in the backup directory, oldest first.
    pub fn backups(&self) -> StoreResult<Vec<PathBuf>> {
        let mut backups = match fs::read_dir(&self.backup_dir) {
            Ok(entries) => entries
                .map(|entry| entry.map(|e| e.path()))
                .collect::<io::Result<Vec<_>>>()?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        backups.sort();
        Ok(backups)
    }

    fn write(&self, state: &SessionState) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(state)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &self.path)?;

        log::debug!(
            "Saved session state to {:?} (save {})",
            self.path,
            self.save_count
        );
        Ok(())
    }

    fn quarantine(&self) -> StoreResult<PathBuf> {
        let target = self.backup_target("corrupt_")?;
        fs::rename(&self.path, &target)?;
        Ok(target)
    }

    /// A fresh `<timestamp>_<tag><file name>` path in the backup directory.
    ///
    /// The timestamp has microsecond resolution and is bumped until the name
    /// is unused.
    fn backup_target(&self, tag: &str) -> StoreResult<PathBuf> {
        fs::create_dir_all(&self.backup_dir)?;
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| STATE_FILE_NAME.to_string());

        let mut micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros();
        loop {
            let name = format!(
                "{}.{:06}_{}{}",
                micros / 1_000_000,
                micros % 1_000_000,
                tag,
                file_name
            );
            let target = self.backup_dir.join(name);
            if !target.exists() {
                return Ok(target);
            }
            micros += 1;
        }
    }

    fn corrupt(&self, reason: String) -> StoreError {
        StoreError::PersistedStateCorrupt {
            path: self.path.clone(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoxSet, LabeledBox, Rectangle};

    fn store(root: &Path) -> SessionStore {
        SessionStore::new(&ProbeLayout::new(root))
    }

    fn sample_state() -> SessionState {
        let mut state = SessionState::fresh("20180430_A050570");
        state.current_crop_index = 4;
        state.internal_boxes.insert(
            "20180430_A050570/images/t1".to_string(),
            BoxSet {
                manual: vec![LabeledBox::new(Rectangle::new(2, 2, 3, 3), "Betula")],
                existing: vec![LabeledBox::new(Rectangle::new(0, 0, 1, 1), "Pinus")],
            },
        );
        state.internal_boxes.insert(
            "20180430_A050570/images/t2".to_string(),
            BoxSet::default(),
        );
        state
    }

    #[test]
    fn test_load_without_file() {
        let temp = tempfile::tempdir().unwrap();
        assert!(store(temp.path()).load().unwrap().is_none());
        assert!(store(temp.path()).load_or_recover().unwrap().is_none());
    }

    #[test]
    fn test_round_trip() {
        let temp = tempfile::tempdir().unwrap();
        let mut store = store(temp.path());

        let state = sample_state();
        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), Some(state));
        assert!(temp.path().join("saved_state.json").exists());
        assert!(!temp.path().join("saved_state.tmp").exists());

        let empty = SessionState::fresh("20180430_A050570");
        store.save(&empty).unwrap();
        assert_eq!(store.load().unwrap(), Some(empty));
    }

    #[test]
    fn test_custom_file_name() {
        let temp = tempfile::tempdir().unwrap();
        let mut store = store(temp.path()).with_file_name("run.json");
        store.save(&sample_state()).unwrap();
        assert!(temp.path().join("run.json").exists());
        assert_eq!(store.path(), temp.path().join("run.json"));
    }

    #[test]
    fn test_periodic_backups() {
        let temp = tempfile::tempdir().unwrap();
        let mut store = store(temp.path()).with_backup_interval(3);

        for index in 0..7 {
            let mut state = sample_state();
            state.current_crop_index = index;
            store.save(&state).unwrap();
        }

        assert_eq!(store.save_count(), 7);
        let backups = store.backups().unwrap();
        assert_eq!(backups.len(), 2);

        // Backups snapshot the third and sixth saves
        let indices: Vec<_> = backups
            .iter()
            .map(|path| {
                let json = fs::read_to_string(path).unwrap();
                serde_json::from_str::<SessionState>(&json)
                    .unwrap()
                    .current_crop_index
            })
            .collect();
        assert_eq!(indices, vec![2, 5]);

        for path in &backups {
            let name = path.file_name().unwrap().to_str().unwrap();
            assert!(name.ends_with("_saved_state.json"), "{name}");
        }
    }

    #[test]
    fn test_zero_interval_disables_periodic_backups() {
        let temp = tempfile::tempdir().unwrap();
        let mut store = store(temp.path()).with_backup_interval(0);
        for _ in 0..5 {
            store.save(&sample_state()).unwrap();
        }
        assert!(store.backups().unwrap().is_empty());
    }

    #[test]
    fn test_save_with_backup_always_backs_up() {
        let temp = tempfile::tempdir().unwrap();
        let mut store = store(temp.path());

        store.save_with_backup(&sample_state()).unwrap();
        store.save_with_backup(&sample_state()).unwrap();

        let backups = store.backups().unwrap();
        assert_eq!(backups.len(), 2);
        assert_ne!(backups[0], backups[1]);
        assert!(backups[0].starts_with(temp.path().join("backups")));
    }

    #[test]
    fn test_backup_without_state_file() {
        let temp = tempfile::tempdir().unwrap();
        assert!(store(temp.path()).backup().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_state() {
        let temp = tempfile::tempdir().unwrap();
        let store = store(temp.path());
        fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(
            store.load(),
            Err(StoreError::PersistedStateCorrupt { .. })
        ));

        assert!(store.load_or_recover().unwrap().is_none());
        assert!(!store.path().exists());

        let backups = store.backups().unwrap();
        assert_eq!(backups.len(), 1);
        let name = backups[0].file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with("_corrupt_saved_state.json"), "{name}");
        assert_eq!(fs::read_to_string(&backups[0]).unwrap(), "{ not json");
    }

    #[test]
    fn test_wrong_shape_is_corrupt() {
        let temp = tempfile::tempdir().unwrap();
        let store = store(temp.path());
        fs::write(store.path(), r#"{"current_crop_index": "three"}"#).unwrap();
        assert!(matches!(
            store.load(),
            Err(StoreError::PersistedStateCorrupt { .. })
        ));
    }
}
