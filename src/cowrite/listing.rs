//! Document list view model: search, sort and display rows.
//!
//! The store returns documents in no particular business order. Anything a
//! sidebar needs (filtering by a search string, the persisted sort option,
//! "Untitled" placeholders, the active marker) is computed here.

use crate::model::{Document, Settings, SortOption};
use crate::text;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentQuery {
    /// Case-insensitive substring matched against title and text content.
    pub search: String,
    pub sort: SortOption,
}

impl DocumentQuery {
    pub fn new(sort: SortOption) -> Self {
        Self {
            search: String::new(),
            sort,
        }
    }

    /// Query using the persisted sort preference.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.document_sort_option)
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        doc.display_title().to_lowercase().contains(&needle)
            || text::plain_text(&doc.content)
                .to_lowercase()
                .contains(&needle)
    }

    /// Filter and order `docs`.
    pub fn apply(&self, docs: Vec<Document>) -> Vec<Document> {
        let mut docs: Vec<Document> = docs.into_iter().filter(|d| self.matches(d)).collect();
        docs.sort_by(|a, b| compare(self.sort, a, b).then_with(|| a.id.cmp(&b.id)));
        docs
    }
}

fn compare(sort: SortOption, a: &Document, b: &Document) -> Ordering {
    match sort {
        SortOption::Title => a
            .title
            .to_lowercase()
            .cmp(&b.title.to_lowercase())
            .then_with(|| a.title.cmp(&b.title)),
        SortOption::WordCount => a.word_count.cmp(&b.word_count),
        // Newest first
        SortOption::CreatedAt => b.created_at.cmp(&a.created_at),
        SortOption::UpdatedAt => b.updated_at.cmp(&a.updated_at),
    }
}

/// One row of the document list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub id: Uuid,
    pub title: String,
    pub word_count: usize,
    pub updated_at: DateTime<Utc>,
    pub active: bool,
}

impl DocumentSummary {
    pub fn from_document(doc: &Document, active: Option<Uuid>) -> Self {
        Self {
            id: doc.id,
            title: doc.display_title().to_string(),
            word_count: text::word_count(&doc.content),
            updated_at: doc.updated_at,
            active: active == Some(doc.id),
        }
    }
}

/// Filter, sort and summarize in one go.
pub fn summarize(
    docs: Vec<Document>,
    query: &DocumentQuery,
    active: Option<Uuid>,
) -> Vec<DocumentSummary> {
    query
        .apply(docs)
        .iter()
        .map(|doc| DocumentSummary::from_document(doc, active))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn doc(title: &str, content: &str, words: usize, age_minutes: i64) -> Document {
        let mut d = Document::new(title.into(), content.into());
        d.word_count = words;
        d.created_at = Utc::now() - Duration::minutes(age_minutes);
        d.updated_at = d.created_at;
        d
    }

    fn titles(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d.title.as_str()).collect()
    }

    #[test]
    fn test_sorts_by_updated_newest_first_by_default() {
        let docs = vec![doc("old", "", 0, 30), doc("new", "", 0, 1), doc("mid", "", 0, 10)];
        let sorted = DocumentQuery::default().apply(docs);
        assert_eq!(titles(&sorted), vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_sorts_by_title_case_insensitively() {
        let docs = vec![doc("banana", "", 0, 1), doc("Apple", "", 0, 2), doc("cherry", "", 0, 3)];
        let sorted = DocumentQuery::new(SortOption::Title).apply(docs);
        assert_eq!(titles(&sorted), vec!["Apple", "banana", "cherry"]);
    }

    #[test]
    fn test_sorts_by_word_count_ascending() {
        let docs = vec![doc("ten", "", 10, 1), doc("one", "", 1, 2), doc("five", "", 5, 3)];
        let sorted = DocumentQuery::new(SortOption::WordCount).apply(docs);
        assert_eq!(titles(&sorted), vec!["one", "five", "ten"]);
    }

    #[test]
    fn test_sorts_by_created_newest_first() {
        let mut older = doc("older", "", 0, 60);
        older.updated_at = Utc::now();
        let docs = vec![older, doc("newer", "", 0, 5)];
        let sorted = DocumentQuery::new(SortOption::CreatedAt).apply(docs);
        assert_eq!(titles(&sorted), vec!["newer", "older"]);
    }

    #[test]
    fn test_search_matches_title_or_text() {
        let docs = vec![
            doc("Groceries", "<p>milk</p>", 1, 1),
            doc("Work", "<p>Quarterly MILK report</p>", 3, 2),
            doc("Travel", "<p>passport</p>", 1, 3),
        ];
        let query = DocumentQuery::new(SortOption::Title).with_search("milk");
        assert_eq!(titles(&query.apply(docs.clone())), vec!["Groceries", "Work"]);

        let query = DocumentQuery::new(SortOption::Title).with_search("groc");
        assert_eq!(titles(&query.apply(docs)), vec!["Groceries"]);
    }

    #[test]
    fn test_search_matches_untitled_placeholder() {
        let docs = vec![doc("", "<p>draft</p>", 1, 1), doc("Named", "", 0, 2)];
        let query = DocumentQuery::default().with_search("untitled");
        let found = query.apply(docs);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].display_title(), "Untitled");
    }

    #[test]
    fn test_search_ignores_markup() {
        let docs = vec![doc("Plain", "<span class=\"x\">hello</span>", 1, 1)];
        let query = DocumentQuery::default().with_search("span");
        assert!(query.apply(docs).is_empty());
    }

    #[test]
    fn test_summaries_use_display_title_and_mark_active() {
        let untitled = doc("", "<p>two words</p>", 2, 1);
        let other = doc("Other", "", 0, 2);
        let active = untitled.id;

        let rows = summarize(vec![untitled, other], &DocumentQuery::default(), Some(active));

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].title, "Untitled");
        assert_eq!(rows[0].word_count, 2);
        assert!(rows[0].active);
        assert!(!rows[1].active);
    }
}
