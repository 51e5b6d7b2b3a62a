//! `localStorage`-backed [`StateStore`].
//!
//! Browsers may deny storage (private mode, disabled cookies); every access
//! failure surfaces as `WorldError::Storage` so the client can fall back to
//! an unsaved session.

use geocoin_world::{Result, StateStore, WorldError};

pub const DEFAULT_KEY: &str = "geocoin.state";

pub struct LocalStorageStore {
    key: String,
}

impl LocalStorageStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn storage(&self) -> Result<web_sys::Storage> {
        web_sys::window()
            .ok_or_else(|| storage_error("no window"))?
            .local_storage()
            .map_err(|e| storage_error(&format!("{:?}", e)))?
            .ok_or_else(|| storage_error("localStorage unavailable"))
    }
}

impl StateStore for LocalStorageStore {
    fn load(&self) -> Result<Option<String>> {
        self.storage()?
            .get_item(&self.key)
            .map_err(|e| storage_error(&format!("{:?}", e)))
    }

    fn save(&mut self, blob: &str) -> Result<()> {
        self.storage()?
            .set_item(&self.key, blob)
            .map_err(|e| storage_error(&format!("{:?}", e)))
    }

    fn clear(&mut self) -> Result<()> {
        self.storage()?
            .remove_item(&self.key)
            .map_err(|e| storage_error(&format!("{:?}", e)))
    }
}

fn storage_error(msg: &str) -> WorldError {
    WorldError::Storage(std::io::Error::other(format!("localStorage: {}", msg)))
}
