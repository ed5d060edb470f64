//! # Cowrite Architecture
//!
//! Cowrite is the **UI-agnostic core of a local document editor**. It keeps a
//! list of rich-text documents in a local key-value medium, tracks the one
//! document being edited, and saves edits after a quiet period. Rendering,
//! toolbars and navigation live in whatever front end embeds it.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Autosave Driver (autosave.rs)                              │
//! │  - Owns the session on a tokio task                         │
//! │  - Debounces edits, publishes save status and list changes  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Editor Session (session.rs, save_state.rs)                 │
//! │  - Current document id and edit buffer                      │
//! │  - Clean / Dirty / Saving / Failed state machine            │
//! │  - Turns store errors into a visible save status            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Document Store (store/)                                    │
//! │  - CRUD over a single persisted Root (documents + settings) │
//! │  - StorageBackend trait: FsBackend, MemBackend (testing)    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: One Source of Truth
//!
//! The store's Root is canonical. The session's buffer shadows exactly one
//! document until the next successful save; after that the stored record is
//! authoritative again. Every store call reads and writes the whole Root, so
//! no two operations can interleave halfway.
//!
//! ## Testing Strategy
//!
//! 1. **Store** (`store/mod.rs`): CRUD contract and recovery, on `MemBackend`.
//! 2. **State machine** (`save_state.rs`): transitions without any I/O.
//! 3. **Session** (`session.rs`): save protocol driven by hand, no clock.
//! 4. **Autosave** (`autosave.rs`): timing scenarios on tokio's paused clock.
//!
//! ## Module Overview
//!
//! - [`store`]: Root persistence and storage backends
//! - [`model`]: Core data types (`Document`, `Settings`, `Root`)
//! - [`session`]: The editor session over the open document
//! - [`save_state`]: Dirty/save state machine and status labels
//! - [`debounce`]: Cancellable deadline used for autosave
//! - [`autosave`]: Task that drives a session with a real clock
//! - [`listing`]: Search, sort and rows for the document list
//! - [`text`]: Plain-text extraction and word counts
//! - [`config`]: Configuration management
//! - [`error`]: Error types

pub mod autosave;
pub mod config;
pub mod debounce;
pub mod error;
pub mod listing;
pub mod model;
pub mod save_state;
pub mod session;
pub mod store;
pub mod text;

pub use autosave::{Autosave, AutosaveHandle, SessionSnapshot};
pub use error::{CowriteError, Result};
pub use model::{Document, DocumentPatch, Settings, SettingsPatch, SortOption, Theme};
pub use save_state::{SaveState, SaveStatus};
pub use session::EditorSession;
pub use store::{DocumentStore, StorageBackend};
