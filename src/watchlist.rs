//! Client-owned watchlist.
//!
//! The server keeps no watchlist state. A client remembers up to
//! [`WATCHLIST_CAPACITY`] assets locally and resolves them through
//! `GET /api/v1/crypto/top/{limit}?use_watchlist=true&watchlist=...`.

use log::debug;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::entity::WatchlistEntry;

pub const WATCHLIST_CAPACITY: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum WatchlistError {
    #[error("Watchlist is full ({0} assets)")]
    Full(usize),

    #[error("{0} is already in the watchlist")]
    Duplicate(String),

    #[error("Invalid asset id: {0}")]
    InvalidId(String),

    #[error("Watchlist storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt watchlist file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug)]
pub struct LocalWatchlist {
    path: PathBuf,
    entries: Vec<WatchlistEntry>,
}

impl LocalWatchlist {
    /// Loads the watchlist stored at `path`; a missing file is an empty list
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WatchlistError> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        debug!("Loaded watchlist from {}", path.display());
        Ok(Self { path, entries })
    }

    pub fn save(&self) -> Result<(), WatchlistError> {
        let content = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn add(&mut self, entry: WatchlistEntry) -> Result<(), WatchlistError> {
        if !crate::utils::validate_asset_id(&entry.asset_id) {
            return Err(WatchlistError::InvalidId(entry.asset_id));
        }
        if self.contains(&entry.asset_id) {
            return Err(WatchlistError::Duplicate(entry.asset_id));
        }
        if self.entries.len() >= WATCHLIST_CAPACITY {
            return Err(WatchlistError::Full(WATCHLIST_CAPACITY));
        }

        self.entries.push(entry);
        Ok(())
    }

    pub fn remove(&mut self, asset_id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.asset_id != asset_id);
        self.entries.len() != before
    }

    pub fn contains(&self, asset_id: &str) -> bool {
        self.entries.iter().any(|e| e.asset_id == asset_id)
    }

    pub fn entries(&self) -> &[WatchlistEntry] {
        &self.entries
    }

    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.asset_id.clone()).collect()
    }

    /// Value for the `watchlist` query parameter, `None` when empty
    pub fn query_param(&self) -> Option<String> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.ids().join(","))
        }
    }
}
