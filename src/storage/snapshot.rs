// src/storage/snapshot.rs
// Whole-store JSON files for progress and settings.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{Result, StudyError};
use crate::progress::ProgressStore;
use crate::queue::Setup;

/// Reads saved progress. A missing file is a first run and yields an empty
/// store; a file that cannot be parsed is an error rather than a silent reset.
pub fn load_progress(path: &Path) -> Result<ProgressStore> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::info!("No progress at {:?}, starting fresh", path);
            return Ok(ProgressStore::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut store: ProgressStore =
        serde_json::from_str(&raw).map_err(|e| StudyError::CorruptProgress(format!("{:?}: {}", path, e)))?;

    let fixed = store.clamp_ease();
    if fixed > 0 {
        log::warn!("Raised ease to the minimum on {} cards", fixed);
    }
    log::info!("Loaded progress for {} cards", store.cards.len());
    Ok(store)
}

pub fn save_progress(path: &Path, store: &ProgressStore) -> Result<()> {
    write_json(path, &serde_json::to_string_pretty(store)?)
}

/// Reads the saved setup, falling back to defaults when absent or unreadable.
pub fn load_setup(path: &Path) -> Setup {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return Setup::default(),
    };
    match serde_json::from_str(&raw) {
        Ok(setup) => setup,
        Err(e) => {
            log::warn!("Ignoring unreadable settings at {:?}: {}", path, e);
            Setup::default()
        }
    }
}

pub fn save_setup(path: &Path, setup: &Setup) -> Result<()> {
    write_json(path, &serde_json::to_string_pretty(setup)?)
}

/// Writes through a sibling temp file so a crash never leaves half a file.
fn write_json(path: &Path, body: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
