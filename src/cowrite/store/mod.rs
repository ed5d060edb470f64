//! # Storage Layer
//!
//! [`DocumentStore`] is the sole authority over durable document and settings
//! state. It sits on top of a [`StorageBackend`], a plain key-value medium
//! that stores one serialized blob per key.
//!
//! ## Whole-Root Persistence
//!
//! Every document and the settings record live in a single [`Root`] value
//! stored under one key (`co_write` by default). Each operation:
//!
//! 1. reads and parses the whole Root,
//! 2. mutates a private copy,
//! 3. serializes and writes the whole Root back.
//!
//! Because the copy is private until the write succeeds, a failed write
//! leaves the durable state exactly as it was. There is no partial
//! persistence and nothing to roll back.
//!
//! Reads never write. Lookups of unknown ids return `None` rather than an
//! error; only an unavailable medium produces an `Err`.
//!
//! ## Recovery
//!
//! A blob that fails to parse at all is treated as an empty Root with default
//! settings. The corrupt value is logged and overwritten by the next write.
//! Inside a readable blob, damage is contained per entry: see [`Root`].
//!
//! ## Implementations
//!
//! - [`fs_backend::FsBackend`]: one JSON file per key in a directory.
//! - [`mem_backend::MemBackend`]: in-memory map for tests.
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/
//! └── co_write.json     # { "documents": {..}, "settings": {..} }
//! ```

use crate::error::Result;
use crate::model::{
    Document, DocumentPatch, Root, Settings, SettingsPatch, COPY_SUFFIX, UNTITLED,
};
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub mod backend;
pub mod fs_backend;
pub mod mem_backend;

pub use backend::StorageBackend;

/// Key under which the Root is stored when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "co_write";

pub struct DocumentStore<B: StorageBackend> {
    backend: B,
    key: String,
    pretty: bool,
}

impl<B: StorageBackend> DocumentStore<B> {
    pub fn with_backend(backend: B) -> Self {
        Self::with_key(backend, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(backend: B, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
            pretty: false,
        }
    }

    /// Write indented JSON instead of the compact form.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Make sure a well-formed Root is persisted, writing an empty one with
    /// default settings if the key is missing or its value is corrupt.
    pub fn ensure_root(&self) -> Result<Root> {
        let (root, needs_write) = self.load_root()?;
        if needs_write {
            self.save_root(&root)?;
        }
        Ok(root)
    }

    fn load_root(&self) -> Result<(Root, bool)> {
        let Some(raw) = self.backend.read(&self.key)? else {
            return Ok((Root::default(), true));
        };
        match serde_json::from_str::<Root>(&raw) {
            Ok(root) => Ok((root, false)),
            Err(e) => {
                warn!(key = %self.key, error = %e, "stored root is malformed, starting empty");
                Ok((Root::default(), true))
            }
        }
    }

    fn save_root(&self, root: &Root) -> Result<()> {
        let blob = if self.pretty {
            serde_json::to_string_pretty(root)?
        } else {
            serde_json::to_string(root)?
        };
        self.backend.write(&self.key, &blob)?;
        debug!(key = %self.key, documents = root.documents.len(), "root written");
        Ok(())
    }

    /// Read-modify-write of the whole Root. `f` returns `None` to signal
    /// that nothing changed, in which case nothing is written.
    fn mutate<T>(&self, f: impl FnOnce(&mut Root) -> Option<T>) -> Result<Option<T>> {
        let (mut root, _) = self.load_root()?;
        match f(&mut root) {
            Some(out) => {
                self.save_root(&root)?;
                Ok(Some(out))
            }
            None => Ok(None),
        }
    }

    fn read_root(&self) -> Result<Root> {
        Ok(self.load_root()?.0)
    }

    /// Create a document. An absent title becomes "Untitled"; an explicitly
    /// empty one is stored as is.
    pub fn create_document(&self, title: Option<&str>, content: Option<&str>) -> Result<Document> {
        let title = title.unwrap_or(UNTITLED).to_string();
        let content = content.unwrap_or_default().to_string();
        let (mut root, _) = self.load_root()?;
        let doc = insert_new(&mut root, title, content);
        self.save_root(&root)?;
        info!(id = %doc.id, title = %doc.title, "document created");
        Ok(doc)
    }

    pub fn get_document(&self, id: &Uuid) -> Result<Option<Document>> {
        Ok(self.read_root()?.documents.remove(id))
    }

    /// Merge `patch` into the document. Returns `None` (and writes nothing)
    /// when the id is unknown.
    pub fn update_document(&self, id: &Uuid, patch: DocumentPatch) -> Result<Option<Document>> {
        self.mutate(|root| {
            let doc = root.documents.get_mut(id)?;
            doc.apply(patch, Utc::now());
            Some(doc.clone())
        })
    }

    /// Remove the document. Returns whether it existed; unknown ids are a
    /// no-op.
    pub fn delete_document(&self, id: &Uuid) -> Result<bool> {
        let removed = self.mutate(|root| root.documents.remove(id))?;
        if removed.is_some() {
            info!(id = %id, "document deleted");
        }
        Ok(removed.is_some())
    }

    /// Copy a document's title (with a " (Copy)" suffix) and content into a
    /// new document with its own id and timestamps.
    pub fn duplicate_document(&self, id: &Uuid) -> Result<Option<Document>> {
        self.mutate(|root| {
            let source = root.documents.get(id)?;
            let title = format!("{}{}", source.title, COPY_SUFFIX);
            let content = source.content.clone();
            Some(insert_new(root, title, content))
        })
    }

    /// All documents, oldest first. Any presentation ordering is up to the
    /// caller.
    pub fn list_documents(&self) -> Result<Vec<Document>> {
        let mut docs: Vec<Document> = self.read_root()?.documents.into_values().collect();
        docs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(docs)
    }

    pub fn get_settings(&self) -> Result<Settings> {
        Ok(self.read_root()?.settings)
    }

    pub fn update_settings(&self, patch: SettingsPatch) -> Result<Settings> {
        let (mut root, _) = self.load_root()?;
        root.settings.merge(patch);
        self.save_root(&root)?;
        Ok(root.settings)
    }
}

fn insert_new(root: &mut Root, title: String, content: String) -> Document {
    let mut doc = Document::new(title, content);
    while root.documents.contains_key(&doc.id) {
        doc.id = Uuid::new_v4();
    }
    root.documents.insert(doc.id, doc.clone());
    doc
}
