//! # Editor Session
//!
//! The session owns the "currently open document": an edit buffer that
//! shadows one stored [`Document`] plus the [`SaveMachine`] tracking whether
//! that buffer has been persisted.
//!
//! The session itself has no notion of time. Edits return an [`Effect`]
//! telling the caller to (re)arm its debounce timer; the caller reports back
//! with [`EditorSession::timer_fired`]. [`crate::autosave`] wires this to a
//! tokio timer, tests can drive it by hand.
//!
//! Store errors never escape a save: they become [`SaveStatus::Error`] and
//! the buffer is kept so the next timer or explicit save can retry.
//!
//! Loading another document abandons unsaved edits to the current one.

use crate::error::Result;
use crate::listing::{self, DocumentQuery, DocumentSummary};
use crate::model::{
    Document, DocumentPatch, Settings, SettingsPatch, SortOption, Theme, UNTITLED,
};
use crate::save_state::{Effect, SaveMachine, SaveState, SaveStatus, SessionEvent};
use crate::store::{DocumentStore, StorageBackend};
use crate::text;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Title given to the document created when the store is empty at startup.
pub const FIRST_DOCUMENT_TITLE: &str = "Untitled document";

/// The transient, editable copy of the open document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditBuffer {
    pub title: String,
    pub content: String,
}

pub struct EditorSession<B: StorageBackend> {
    store: DocumentStore<B>,
    current: Option<Uuid>,
    buffer: EditBuffer,
    machine: SaveMachine,
    word_count: usize,
    list_revision: u64,
}

impl<B: StorageBackend> EditorSession<B> {
    pub fn new(store: DocumentStore<B>) -> Self {
        Self {
            store,
            current: None,
            buffer: EditBuffer::default(),
            machine: SaveMachine::new(),
            word_count: 0,
            list_revision: 0,
        }
    }

    pub fn store(&self) -> &DocumentStore<B> {
        &self.store
    }

    pub fn current_document_id(&self) -> Option<Uuid> {
        self.current
    }

    pub fn buffer(&self) -> &EditBuffer {
        &self.buffer
    }

    pub fn state(&self) -> SaveState {
        self.machine.state()
    }

    pub fn status(&self) -> SaveStatus {
        self.machine.status()
    }

    /// Live word count of the buffer.
    pub fn word_count(&self) -> usize {
        self.word_count
    }

    /// Bumped whenever the document list may have changed.
    pub fn list_revision(&self) -> u64 {
        self.list_revision
    }

    /// Rows for the document list.
    pub fn documents(&self, query: &DocumentQuery) -> Result<Vec<DocumentSummary>> {
        Ok(listing::summarize(
            self.store.list_documents()?,
            query,
            self.current,
        ))
    }

    pub fn settings(&self) -> Result<Settings> {
        self.store.get_settings()
    }

    pub fn auto_save_interval(&self) -> Result<Duration> {
        Ok(Duration::from_millis(self.settings()?.auto_save_interval))
    }

    /// Pick the document to open at startup: `requested` if it exists, else
    /// the first stored document, else a freshly created one.
    pub fn open_initial(&mut self, requested: Option<Uuid>) -> Result<Uuid> {
        if let Some(id) = requested {
            if self.load_document(&id)? {
                return Ok(id);
            }
            debug!(%id, "requested document not found, falling back");
        }

        let id = match self.store.list_documents()?.first() {
            Some(doc) => doc.id,
            None => {
                let doc = self
                    .store
                    .create_document(Some(FIRST_DOCUMENT_TITLE), Some(""))?;
                self.list_revision += 1;
                doc.id
            }
        };
        self.load_document(&id)?;
        Ok(id)
    }

    /// Open a document, discarding any unsaved edits to the current one.
    /// Returns `false` and leaves the session untouched if `id` is unknown.
    pub fn load_document(&mut self, id: &Uuid) -> Result<bool> {
        let Some(doc) = self.store.get_document(id)? else {
            return Ok(false);
        };
        if self.machine.is_dirty() {
            debug!(id = ?self.current, "discarding unsaved edits");
        }
        self.buffer = EditBuffer {
            title: doc.display_title().to_string(),
            content: doc.content.clone(),
        };
        self.word_count = text::word_count(&doc.content);
        self.current = Some(doc.id);
        self.machine.reset();
        info!(id = %doc.id, title = %doc.title, "document loaded");
        Ok(true)
    }

    pub fn edit_title(&mut self, title: impl Into<String>) -> Option<Effect> {
        self.current?;
        self.buffer.title = title.into();
        self.machine.handle(SessionEvent::EditOccurred)
    }

    /// Content changes, including checkbox toggles inside the content.
    pub fn edit_content(&mut self, content: impl Into<String>) -> Option<Effect> {
        self.current?;
        self.buffer.content = content.into();
        self.word_count = text::word_count(&self.buffer.content);
        self.machine.handle(SessionEvent::EditOccurred)
    }

    /// The debounce timer elapsed. Saves if there are pending edits.
    pub fn timer_fired(&mut self) -> SaveStatus {
        if self.current.is_some()
            && self.machine.handle(SessionEvent::TimerFired) == Some(Effect::Persist)
        {
            self.persist();
        }
        self.status()
    }

    /// Explicit save, e.g. a keyboard shortcut. Persists even when clean.
    pub fn save(&mut self) -> SaveStatus {
        if self.current.is_some()
            && self.machine.handle(SessionEvent::SaveRequested) == Some(Effect::Persist)
        {
            self.persist();
        }
        self.status()
    }

    fn persist(&mut self) {
        let Some(id) = self.current else {
            return;
        };
        let title = match self.buffer.title.trim() {
            "" => UNTITLED.to_string(),
            trimmed => trimmed.to_string(),
        };
        let content = self.buffer.content.clone();
        let word_count = text::word_count(&content);
        let patch = DocumentPatch {
            title: Some(title),
            content: Some(content),
            word_count: Some(word_count),
        };

        let succeeded = match self.store.update_document(&id, patch) {
            Ok(Some(doc)) => {
                debug!(id = %doc.id, words = doc.word_count, "document saved");
                self.list_revision += 1;
                true
            }
            Ok(None) => {
                warn!(%id, "save failed: document no longer exists");
                false
            }
            Err(e) => {
                warn!(%id, error = %e, "save failed");
                false
            }
        };
        self.machine.handle(SessionEvent::SaveCompleted { succeeded });
    }

    /// Create a document with default title and content and open it.
    pub fn new_document(&mut self) -> Result<Document> {
        let doc = self.store.create_document(None, None)?;
        self.list_revision += 1;
        self.load_document(&doc.id)?;
        Ok(doc)
    }

    /// Delete a document. If it was the open one, open the first remaining
    /// document, or a new one when none remain.
    pub fn delete_document(&mut self, id: &Uuid) -> Result<()> {
        if self.store.delete_document(id)? {
            self.list_revision += 1;
        }
        if self.current.is_some() && self.current != Some(*id) {
            return Ok(());
        }
        match self.store.list_documents()?.first() {
            Some(doc) => {
                let next = doc.id;
                self.load_document(&next)?;
            }
            None => {
                self.new_document()?;
            }
        }
        Ok(())
    }

    /// Duplicate a document and open the copy.
    pub fn duplicate_document(&mut self, id: &Uuid) -> Result<Option<Document>> {
        let copy = self.store.duplicate_document(id)?;
        if let Some(doc) = &copy {
            self.list_revision += 1;
            self.load_document(&doc.id)?;
        }
        Ok(copy)
    }

    pub fn toggle_theme(&mut self) -> Result<Theme> {
        let next = self.settings()?.theme.toggled();
        let settings = self.store.update_settings(SettingsPatch {
            theme: Some(next),
            ..Default::default()
        })?;
        Ok(settings.theme)
    }

    pub fn set_focus_mode(&mut self, enabled: bool) -> Result<Settings> {
        self.store.update_settings(SettingsPatch {
            focus_mode: Some(enabled),
            ..Default::default()
        })
    }

    pub fn set_sort_option(&mut self, sort: SortOption) -> Result<Settings> {
        let settings = self.store.update_settings(SettingsPatch {
            document_sort_option: Some(sort),
            ..Default::default()
        })?;
        self.list_revision += 1;
        Ok(settings)
    }
}
