use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CatalogRecord, FieldLimit, FieldViolation, check_present, check_required};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Book {
    pub id: u64,
    pub title: String,
    pub author: String,
    pub category: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookDraft {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookFields {
    pub title: String,
    pub author: String,
    pub category: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookLimits {
    pub title: FieldLimit,
    pub author: FieldLimit,
    pub category: FieldLimit,
}

impl Default for BookLimits {
    fn default() -> Self {
        Self {
            title: FieldLimit::new(5, 100),
            author: FieldLimit::new(2, 50),
            category: FieldLimit::new(3, 20),
        }
    }
}

impl CatalogRecord for Book {
    type Draft = BookDraft;
    type Fields = BookFields;
    type Patch = BookPatch;
    type Limits = BookLimits;

    const KIND: &'static str = "book";

    fn id(&self) -> u64 {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn summary(&self) -> &str {
        &self.author
    }

    fn validate_draft(
        draft: BookDraft,
        limits: &BookLimits,
    ) -> Result<BookFields, Vec<FieldViolation>> {
        let mut violations = Vec::new();
        check_required(&mut violations, "title", draft.title.as_deref(), &limits.title);
        check_required(&mut violations, "author", draft.author.as_deref(), &limits.author);
        check_required(
            &mut violations,
            "category",
            draft.category.as_deref(),
            &limits.category,
        );

        match (draft.title, draft.author, draft.category) {
            (Some(title), Some(author), Some(category)) if violations.is_empty() => {
                Ok(BookFields {
                    title,
                    author,
                    category,
                })
            }
            _ => Err(violations),
        }
    }

    fn validate_patch(patch: &BookPatch, limits: &BookLimits) -> Vec<FieldViolation> {
        let mut violations = Vec::new();
        check_present(&mut violations, "title", patch.title.as_deref(), &limits.title);
        check_present(&mut violations, "author", patch.author.as_deref(), &limits.author);
        check_present(
            &mut violations,
            "category",
            patch.category.as_deref(),
            &limits.category,
        );
        violations
    }

    fn create(id: u64, fields: BookFields, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: fields.title,
            author: fields.author,
            category: fields.category,
            updated_at: now,
        }
    }

    fn apply_patch(&mut self, patch: BookPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(author) = patch.author {
            self.author = author;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        self.updated_at = now;
    }
}

pub fn seed_books(now: DateTime<Utc>) -> Vec<Book> {
    [
        (1, "Atomic Habits", "James Clear", "Self-Help"),
        (2, "The Gifts of Imperfection", "Brené Brown", "Motivational"),
        (3, "The Mountain Is You", "Brianna Wiest", "Self-Help"),
        (4, "The Daily Stoic", "Ryan Holiday", "Motivational"),
        (5, "Start With Why", "Simon Sinek", "Logical"),
    ]
    .into_iter()
    .map(|(id, title, author, category)| Book {
        id,
        title: title.to_string(),
        author: author.to_string(),
        category: category.to_string(),
        updated_at: now,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn draft(title: &str, author: &str, category: &str) -> BookDraft {
        BookDraft {
            title: Some(title.to_string()),
            author: Some(author.to_string()),
            category: Some(category.to_string()),
        }
    }

    #[test]
    fn valid_draft_yields_fields() {
        let fields =
            Book::validate_draft(draft("Deep Work", "Cal Newport", "Focus"), &BookLimits::default())
                .unwrap();
        assert_eq!(fields.title, "Deep Work");
        assert_eq!(fields.author, "Cal Newport");
        assert_eq!(fields.category, "Focus");
    }

    #[test]
    fn draft_reports_every_violation() {
        let err = Book::validate_draft(
            BookDraft {
                title: Some("Abc".to_string()),
                author: None,
                category: Some("x".repeat(21)),
            },
            &BookLimits::default(),
        )
        .unwrap_err();

        let fields: Vec<_> = err.iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["title", "author", "category"]);
        assert_eq!(err[1].reason, "field is required");
    }

    #[test]
    fn patch_checks_only_present_fields() {
        let patch = BookPatch {
            title: None,
            author: Some("A".to_string()),
            category: None,
        };
        let violations = Book::validate_patch(&patch, &BookLimits::default());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "author");

        assert!(Book::validate_patch(&BookPatch::default(), &BookLimits::default()).is_empty());
    }

    #[test]
    fn apply_patch_keeps_absent_fields() {
        let then = Utc::now();
        let mut book = seed_books(then).remove(0);
        let later = then + chrono::Duration::seconds(5);

        book.apply_patch(
            BookPatch {
                title: Some("Atomic Habits, 2nd ed.".to_string()),
                ..Default::default()
            },
            later,
        );

        assert_eq!(book.title, "Atomic Habits, 2nd ed.");
        assert_eq!(book.author, "James Clear");
        assert_eq!(book.category, "Self-Help");
        assert_eq!(book.updated_at, later);
    }

    #[test]
    fn text_search_uses_case_folding() {
        let book = Book::create(
            9,
            BookFields {
                title: "Die Große Straße".to_string(),
                author: "Ingrid Weiß".to_string(),
                category: "Travel".to_string(),
            },
            Utc::now(),
        );
        assert!(book.matches_text("STRASSE"));
        assert!(book.matches_text("weiss"));
        assert!(book.has_title("DIE GROSSE STRASSE"));
        assert!(!book.matches_text("Strand"));
    }

    #[test]
    fn null_patch_fields_are_treated_as_absent() {
        let patch: BookPatch =
            serde_json::from_value(serde_json::json!({"title": null, "author": "Ann"})).unwrap();
        assert_eq!(patch.title, None);
        assert_eq!(patch.author.as_deref(), Some("Ann"));
    }

    #[test]
    fn serializes_with_rfc3339_timestamp() {
        let now = "2024-05-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let book = seed_books(now).remove(0);
        let value = serde_json::to_value(&book).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": 1,
                "title": "Atomic Habits",
                "author": "James Clear",
                "category": "Self-Help",
                "updated_at": "2024-05-01T12:00:00Z",
            })
        );
    }
}
