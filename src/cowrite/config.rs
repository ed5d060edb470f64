//! # Configuration
//!
//! Deployment configuration is loaded with [`confique`] from an optional TOML
//! file layered over compiled defaults. It only describes *where* documents
//! live; user preferences (theme, autosave interval, sort order) are part of
//! the stored [`Settings`](crate::model::Settings) instead.
//!
//! ## Location
//!
//! 1. An explicit path passed to [`CowriteConfig::load`].
//! 2. `cowrite.toml` in the OS config directory (via `directories`), used by
//!    [`CowriteConfig::load_default`].
//! 3. Compiled defaults via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `storage_key` | `co_write` | Key (file stem) the document Root is stored under |
//! | `data_dir` | OS data directory | Directory holding the stored blobs |
//! | `pretty` | `true` | Indent the stored JSON |

use crate::error::{CowriteError, Result};
use crate::store::fs_backend::FsBackend;
use crate::store::{DocumentStore, DEFAULT_STORAGE_KEY};
use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "cowrite.toml";

/// Configuration for cowrite, stored in `cowrite.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CowriteConfig {
    /// Key the document Root is stored under. Also the file stem on disk.
    #[config(default = "co_write")]
    pub storage_key: String,

    /// Directory holding the stored blobs. When absent, the OS data
    /// directory for cowrite is used.
    pub data_dir: Option<PathBuf>,

    /// Write indented JSON.
    #[config(default = true)]
    pub pretty: bool,
}

impl Default for CowriteConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            data_dir: None,
            pretty: true,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "cowrite")
}

impl CowriteConfig {
    /// Load from `path` if it exists, falling back to defaults for every key
    /// it does not set.
    pub fn load(path: &Path) -> Result<Self> {
        let config = Self::builder()
            .file(path)
            .load()
            .map_err(|e| CowriteError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the OS config directory, or defaults when there is none.
    pub fn load_default() -> Result<Self> {
        match project_dirs() {
            Some(dirs) => Self::load(&dirs.config_dir().join(CONFIG_FILENAME)),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let key = self.storage_key.trim();
        if key.is_empty() {
            return Err(CowriteError::Config("storage_key must not be empty".into()));
        }
        if key.contains(|c: char| c == '/' || c == '\\') || key.starts_with('.') {
            return Err(CowriteError::Config(format!(
                "storage_key {:?} must be a plain file name",
                self.storage_key
            )));
        }
        Ok(())
    }

    /// The configured data directory, or the OS default.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| CowriteError::Config("no data directory available".into()))
    }

    /// Open the file-backed store described by this config, initializing
    /// the stored Root on first use.
    pub fn open_store(&self) -> Result<DocumentStore<FsBackend>> {
        self.validate()?;
        let store = DocumentStore::with_key(FsBackend::new(self.data_dir()?), &self.storage_key)
            .pretty(self.pretty);
        store.ensure_root()?;
        Ok(store)
    }
}
