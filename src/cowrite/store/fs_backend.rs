use super::backend::StorageBackend;
use crate::error::{CowriteError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::warn;
use uuid::Uuid;

/// File-based backend: each key is stored as `<root>/<key>.json`.
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Path of the file holding `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(|e| {
                CowriteError::PersistenceUnavailable(format!(
                    "cannot create {}: {}",
                    self.root.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}

impl StorageBackend for FsBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(content) => Ok(Some(content)),
                // Not ours to reject here: hand the store something it will
                // fail to parse and recover from.
                Err(e) => {
                    warn!(key, error = %e.utf8_error(), "stored blob is not valid UTF-8");
                    Ok(Some(String::from_utf8_lossy(e.as_bytes()).into_owned()))
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CowriteError::PersistenceUnavailable(e.to_string())),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_dir()?;

        let target = self.path_for(key);

        // Atomic write
        let tmp = self.root.join(format!(".{}-{}.tmp", key, Uuid::new_v4()));
        fs::write(&tmp, value)
            .map_err(|e| CowriteError::PersistenceUnavailable(e.to_string()))?;
        if let Err(e) = fs::rename(&tmp, &target) {
            let _ = fs::remove_file(&tmp);
            return Err(CowriteError::PersistenceUnavailable(e.to_string()));
        }

        Ok(())
    }
}
