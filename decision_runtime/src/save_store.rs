//! Save store: named snapshot files in one directory.
//!
//! `<dir>/<name>.edsave`. Loading never fails loudly: a missing or
//! unreadable save is reported as `None` and logged.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use decision_engine::arithmetic::is_valid_card_id;
use decision_engine::state::GameState;

use crate::snapshot::SaveSnapshot;
use crate::snapshot_codec::{decode_snapshot, encode_snapshot, validate_snapshot, SnapshotError};

pub const SAVE_EXTENSION: &str = "edsave";
pub const DEFAULT_SAVE_DIR: &str = "saves";
pub const DEFAULT_SAVE_NAME: &str = "autosave";

#[derive(Debug, Clone)]
pub struct SaveStore {
    dir: PathBuf,
}

impl Default for SaveStore {
    fn default() -> Self {
        Self::new(DEFAULT_SAVE_DIR)
    }
}

impl SaveStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save names share the card id alphabet: `[A-Za-z0-9_-]+`.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, SnapshotError> {
        if !is_valid_card_id(name) {
            return Err(SnapshotError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{}.{}", name, SAVE_EXTENSION)))
    }

    /// Capture `state` and write it under `name`, replacing any existing
    /// save with that name.
    pub fn save(&self, state: &GameState, name: &str) -> Result<PathBuf, SnapshotError> {
        self.save_snapshot(&SaveSnapshot::capture(state), name)
    }

    pub fn save_snapshot(&self, snap: &SaveSnapshot, name: &str) -> Result<PathBuf, SnapshotError> {
        let path = self.path_for(name)?;
        let text = encode_snapshot(snap)?;

        fs::create_dir_all(&self.dir)?;
        let mut file = File::create(&path)?;
        file.write_all(text.as_bytes())?;
        file.sync_all()?;

        info!(path = %path.display(), day = snap.current_day, "game saved");
        Ok(path)
    }

    /// `None` if the save is missing, malformed or violates invariants.
    pub fn load(&self, name: &str) -> Option<SaveSnapshot> {
        match self.try_load(name) {
            Ok(snap) => Some(snap),
            Err(SnapshotError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                warn!(name, "no save found");
                None
            }
            Err(e) => {
                warn!(name, error = %e, "ignoring unreadable save");
                None
            }
        }
    }

    /// Like `load`, returning the rebuilt state.
    pub fn load_state(&self, name: &str) -> Option<GameState> {
        self.load(name).map(|snap| snap.restore())
    }

    fn try_load(&self, name: &str) -> Result<SaveSnapshot, SnapshotError> {
        let path = self.path_for(name)?;
        let text = fs::read_to_string(&path)?;
        let snap = decode_snapshot(&text)?;
        validate_snapshot(&snap)?;
        debug!(path = %path.display(), "save loaded");
        Ok(snap)
    }

    /// Names of all saves, sorted. A missing directory has no saves.
    pub fn list_saves(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "cannot list saves");
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension()? != SAVE_EXTENSION {
                    return None;
                }
                path.file_stem()?.to_str().map(str::to_string)
            })
            .collect();
        names.sort();
        names
    }

    /// Returns false if there was nothing to delete.
    pub fn delete(&self, name: &str) -> bool {
        match self.path_for(name) {
            Ok(path) => fs::remove_file(path).is_ok(),
            Err(_) => false,
        }
    }
}
