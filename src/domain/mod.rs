use caseless::{default_case_fold_str, default_caseless_match_str};
use chrono::{DateTime, Utc};
use serde::Serialize;

mod book;
mod todo;

pub use book::{Book, BookDraft, BookFields, BookLimits, BookPatch, seed_books};
pub use todo::{Priority, Todo, TodoDraft, TodoFields, TodoLimits, TodoPatch, seed_todos};

/// A record kind the store and the catalog service can hold.
///
/// Every kind has a store-issued integer id, a title-like field used for
/// exact lookups, a category-like field used for list filtering, and a
/// secondary text field that participates in free-text search.
pub trait CatalogRecord: Clone + Send + Sync + 'static {
    /// Create payload as received from a client.
    type Draft: Send;
    /// Create payload after validation.
    type Fields: Send;
    /// Partial update payload; every field optional.
    type Patch: Send;
    /// Length constraints handed in by configuration.
    type Limits: Send + Sync;

    /// Lowercase kind name used in logs and error messages.
    const KIND: &'static str;

    fn id(&self) -> u64;
    fn title(&self) -> &str;
    fn category(&self) -> &str;
    fn summary(&self) -> &str;

    fn validate_draft(
        draft: Self::Draft,
        limits: &Self::Limits,
    ) -> Result<Self::Fields, Vec<FieldViolation>>;

    fn validate_patch(patch: &Self::Patch, limits: &Self::Limits) -> Vec<FieldViolation>;

    fn create(id: u64, fields: Self::Fields, now: DateTime<Utc>) -> Self;

    /// Applies the present fields of `patch` and stamps `now`.
    fn apply_patch(&mut self, patch: Self::Patch, now: DateTime<Utc>);

    fn in_category(&self, category: &str) -> bool {
        fold_eq(self.category(), category)
    }

    fn has_title(&self, title: &str) -> bool {
        fold_eq(self.title(), title)
    }

    fn matches_text(&self, text: &str) -> bool {
        let needle = default_case_fold_str(text);
        default_case_fold_str(self.title()).contains(&needle)
            || default_case_fold_str(self.summary()).contains(&needle)
    }
}

/// Equality under full Unicode case folding, so `ß` matches `SS`.
pub fn fold_eq(a: &str, b: &str) -> bool {
    default_caseless_match_str(a, b)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub reason: String,
}

impl FieldViolation {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }

    pub fn required(field: &'static str) -> Self {
        Self::new(field, "field is required")
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Inclusive character-count bounds for one text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLimit {
    pub min: u64,
    pub max: u64,
}

impl FieldLimit {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn check(&self, field: &'static str, value: &str) -> Option<FieldViolation> {
        let len = value.chars().count() as u64;
        if len < self.min {
            return Some(FieldViolation::new(
                field,
                format!("must be at least {} characters, got {len}", self.min),
            ));
        }
        if len > self.max {
            return Some(FieldViolation::new(
                field,
                format!("must be at most {} characters, got {len}", self.max),
            ));
        }
        None
    }
}

/// Checks a required field, collecting any violation into `out`.
pub(crate) fn check_required(
    out: &mut Vec<FieldViolation>,
    field: &'static str,
    value: Option<&str>,
    limit: &FieldLimit,
) {
    match value {
        Some(value) => out.extend(limit.check(field, value)),
        None => out.push(FieldViolation::required(field)),
    }
}

/// Checks an optional field; absence is never a violation.
pub(crate) fn check_present(
    out: &mut Vec<FieldViolation>,
    field: &'static str,
    value: Option<&str>,
    limit: &FieldLimit,
) {
    if let Some(value) = value {
        out.extend(limit.check(field, value));
    }
}
