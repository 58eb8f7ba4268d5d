//! Application configuration, read from an optional JSON file.
//!
//! Every field has a default, so an empty object (or no file at all)
//! gives a working setup.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::state::query::QueryState;
use crate::state::sort::SortOption;

/// Directory name under the user's data directory
const APP_DIR: &str = "shopping-list";
const DB_FILE: &str = "shopping_list.db";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Where the SQLite file lives. `None` picks the per-user data directory:
    /// - Linux: ~/.local/share/shopping-list/shopping_list.db
    /// - macOS: ~/Library/Application Support/shopping-list/shopping_list.db
    /// - Windows: %APPDATA%\shopping-list\shopping_list.db
    pub database_path: Option<PathBuf>,
    /// Sort order a new session starts with
    pub default_sort: SortOption,
}

impl Config {
    /// Parse from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Convert to a JSON string for saving
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read the config file; a missing file yields the defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => Self::from_json(&json),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Query a new session starts with
    pub fn initial_query(&self) -> QueryState {
        QueryState {
            sort: self.default_sort,
            ..QueryState::default()
        }
    }

    /// Resolve the database location
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }

        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or(Error::NoDataDir)?;

        path.push(APP_DIR);
        path.push(DB_FILE);
        Ok(path)
    }
}
