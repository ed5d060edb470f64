//! Core data types: [`Document`], [`Settings`] and the persisted [`Root`].
//!
//! Everything the store owns lives in a single [`Root`] value that is
//! serialized as one JSON blob. Documents are keyed by their id; settings are
//! a single record shared by every document.
//!
//! A Root is read entry by entry. A stored document that does not parse (a
//! foreign id format, a missing timestamp) is set aside in
//! [`Root::unreadable`] and written back verbatim, so one bad record never
//! costs its siblings. Unparseable settings fall back to defaults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::warn;
use uuid::Uuid;

/// Title given to documents created without one, and shown for documents
/// whose stored title is empty.
pub const UNTITLED: &str = "Untitled";

/// Suffix appended to the title of a duplicated document.
pub const COPY_SUFFIX: &str = " (Copy)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    #[serde(default)]
    pub title: String,
    /// Opaque markup produced by the editing surface. Never interpreted here.
    #[serde(default)]
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub word_count: usize,
}

impl Document {
    pub fn new(title: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            content,
            created_at: now,
            updated_at: now,
            word_count: 0,
        }
    }

    /// The title as a list or editor should show it.
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            UNTITLED
        } else {
            &self.title
        }
    }

    /// Refresh `updated_at`. The timestamp never moves backwards, even if the
    /// wall clock does.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.updated_at).max(self.created_at);
    }

    /// Merge the supplied fields and refresh `updated_at`.
    pub fn apply(&mut self, patch: DocumentPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(word_count) = patch.word_count {
            self.word_count = word_count;
        }
        self.touch(now);
    }
}

/// Partial update for a [`Document`]. Omitted fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub word_count: Option<usize>,
}

impl DocumentPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn with_word_count(mut self, word_count: usize) -> Self {
        self.word_count = Some(word_count);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOption {
    #[default]
    UpdatedAt,
    CreatedAt,
    Title,
    WordCount,
}

pub const DEFAULT_AUTO_SAVE_INTERVAL_MS: u64 = 2000;

fn default_auto_save_interval() -> u64 {
    DEFAULT_AUTO_SAVE_INTERVAL_MS
}

/// Application-wide preferences. Missing keys in the persisted record fall
/// back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub theme: Theme,
    /// Autosave debounce interval in milliseconds.
    #[serde(default = "default_auto_save_interval")]
    pub auto_save_interval: u64,
    #[serde(default)]
    pub focus_mode: bool,
    #[serde(default, alias = "documentSortOption")]
    pub document_sort_option: SortOption,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            auto_save_interval: DEFAULT_AUTO_SAVE_INTERVAL_MS,
            focus_mode: false,
            document_sort_option: SortOption::UpdatedAt,
        }
    }
}

impl Settings {
    /// Shallow merge: every supplied key overwrites, the rest are kept.
    pub fn merge(&mut self, patch: SettingsPatch) {
        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
        if let Some(interval) = patch.auto_save_interval {
            self.auto_save_interval = interval;
        }
        if let Some(focus_mode) = patch.focus_mode {
            self.focus_mode = focus_mode;
        }
        if let Some(sort) = patch.document_sort_option {
            self.document_sort_option = sort;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub theme: Option<Theme>,
    pub auto_save_interval: Option<u64>,
    pub focus_mode: Option<bool>,
    pub document_sort_option: Option<SortOption>,
}

/// The single persisted aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredRoot", into = "StoredRoot")]
pub struct Root {
    pub documents: HashMap<Uuid, Document>,
    pub settings: Settings,
    /// Stored document entries that could not be read, by their stored key.
    /// Never listed; preserved on write.
    pub unreadable: BTreeMap<String, Value>,
}

/// On-disk shape of a [`Root`], loose enough that one bad entry can be
/// isolated instead of failing the whole blob.
#[derive(Serialize, Deserialize)]
struct StoredRoot {
    #[serde(default)]
    documents: Map<String, Value>,
    #[serde(default)]
    settings: Value,
}

impl From<StoredRoot> for Root {
    fn from(stored: StoredRoot) -> Self {
        let mut root = Root::default();
        for (key, value) in stored.documents {
            match serde_json::from_value::<Document>(value.clone()) {
                Ok(doc) => {
                    root.documents.insert(doc.id, doc);
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "skipping unreadable document");
                    root.unreadable.insert(key, value);
                }
            }
        }
        root.settings = match stored.settings {
            Value::Null => Settings::default(),
            value => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!(error = %e, "stored settings are malformed, using defaults");
                Settings::default()
            }),
        };
        root
    }
}

impl From<Root> for StoredRoot {
    fn from(root: Root) -> Self {
        let mut documents: Map<String, Value> = root.unreadable.into_iter().collect();
        for (id, doc) in root.documents {
            // Document only holds strings, numbers and timestamps
            if let Ok(value) = serde_json::to_value(doc) {
                documents.insert(id.to_string(), value);
            }
        }
        StoredRoot {
            documents,
            settings: serde_json::to_value(root.settings).unwrap_or(Value::Null),
        }
    }
}
