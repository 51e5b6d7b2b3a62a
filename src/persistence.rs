//! Persistence bridge: opaque JSON blobs behind a small storage trait.
//!
//! The engine never touches storage directly; callers pair a
//! [`StateStore`] with [`crate::GeocacheService::snapshot`] and
//! [`crate::GeocacheService::restore_or_fresh`].

use crate::error::{Result, WorldError};
use crate::protocol::SavedState;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Encode a snapshot as the on-disk / in-browser blob.
pub fn encode_state(state: &SavedState) -> Result<String> {
    serde_json::to_string(state).map_err(|e| WorldError::CorruptState(e.to_string()))
}

/// Decode a blob, rejecting anything that would put non-finite numbers into
/// the world.
pub fn decode_state(blob: &str) -> Result<SavedState> {
    let state: SavedState =
        serde_json::from_str(blob).map_err(|e| WorldError::CorruptState(e.to_string()))?;

    if !state.player.is_finite() {
        return Err(WorldError::CorruptState(format!(
            "player position {} is not finite",
            state.player
        )));
    }
    if let Some(bad) = state.history.iter().find(|p| !p.is_finite()) {
        return Err(WorldError::CorruptState(format!(
            "history position {} is not finite",
            bad
        )));
    }
    Ok(state)
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Somewhere a single state blob can be kept between sessions.
pub trait StateStore {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<String>>;
    fn save(&mut self, blob: &str) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blob: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Some(blob.into()),
        }
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.blob.clone())
    }

    fn save(&mut self, blob: &str) -> Result<()> {
        self.blob = Some(blob.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.blob = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File store
// ---------------------------------------------------------------------------

/// Keeps the blob in a single file. A missing file means "no saved state".
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for FileStore {
    fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, blob: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        // Replace atomically; a failed write leaves the previous blob.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, blob)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
