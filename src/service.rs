//! Catalog service: validates inbound payloads, drives the record store and
//! maps store results to outcomes (record, no payload, not found, invalid).

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::{
    config::{Config, ConfigError},
    domain::{Book, CatalogRecord, FieldViolation, Todo, seed_books, seed_todos},
    store::{RecordStore, StoreError, StoreInit},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    NotFound { kind: &'static str, key: String },
    Validation(Vec<FieldViolation>),
}

impl CatalogError {
    fn not_found_id(kind: &'static str, id: u64) -> Self {
        Self::NotFound {
            kind,
            key: format!("id: {id}"),
        }
    }
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, key } => write!(f, "{kind} with {key} not found"),
            Self::Validation(violations) => {
                write!(f, "validation failed")?;
                for (i, v) in violations.iter().enumerate() {
                    let sep = if i == 0 { ": " } else { "; " };
                    write!(f, "{sep}{v}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for CatalogError {}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    /// `None` and `Some(0)` both mean unlimited.
    pub limit: Option<usize>,
}

pub struct CatalogService<R: CatalogRecord> {
    store: Arc<RecordStore<R>>,
    limits: R::Limits,
}

pub type BookService = CatalogService<Book>;
pub type TodoService = CatalogService<Todo>;

impl<R: CatalogRecord> CatalogService<R> {
    pub fn new(store: Arc<RecordStore<R>>, limits: R::Limits) -> Self {
        Self { store, limits }
    }

    pub fn store(&self) -> &Arc<RecordStore<R>> {
        &self.store
    }

    pub fn create(&self, draft: R::Draft) -> Result<R, CatalogError> {
        let fields = R::validate_draft(draft, &self.limits).map_err(|violations| {
            warn!(kind = R::KIND, violations = violations.len(), "rejected create");
            CatalogError::Validation(violations)
        })?;

        let id = self.store.allocate_id();
        let record = self.store.insert(R::create(id, fields, Utc::now()));
        info!(kind = R::KIND, id, title = record.title(), "created record");
        Ok(record)
    }

    pub fn get(&self, id: u64) -> Result<R, CatalogError> {
        match self.store.find_by_id(id) {
            Some(record) => {
                info!(kind = R::KIND, id, title = record.title(), "retrieved record");
                Ok(record)
            }
            None => {
                warn!(kind = R::KIND, id, "record not found");
                Err(CatalogError::not_found_id(R::KIND, id))
            }
        }
    }

    pub fn get_by_title(&self, title: &str) -> Result<R, CatalogError> {
        match self.store.find_by_title(title) {
            Some(record) => {
                info!(kind = R::KIND, id = record.id(), title, "retrieved record by title");
                Ok(record)
            }
            None => {
                warn!(kind = R::KIND, title, "record not found by title");
                Err(CatalogError::NotFound {
                    kind: R::KIND,
                    key: format!("title: {title}"),
                })
            }
        }
    }

    pub fn list(&self, query: &ListQuery) -> Vec<R> {
        let mut records = self.store.list(query.category.as_deref());
        if let Some(text) = query.search.as_deref().filter(|t| !t.is_empty()) {
            records.retain(|r| r.matches_text(text));
        }
        if let Some(limit) = query.limit.filter(|l| *l > 0) {
            records.truncate(limit);
        }
        info!(kind = R::KIND, count = records.len(), "listed records");
        records
    }

    pub fn update(&self, id: u64, patch: R::Patch) -> Result<R, CatalogError> {
        let violations = R::validate_patch(&patch, &self.limits);
        if !violations.is_empty() {
            warn!(kind = R::KIND, id, violations = violations.len(), "rejected update");
            return Err(CatalogError::Validation(violations));
        }

        let Some(mut record) = self.store.find_by_id(id) else {
            warn!(kind = R::KIND, id, "record not found for update");
            return Err(CatalogError::not_found_id(R::KIND, id));
        };

        record.apply_patch(patch, Utc::now());
        if !self.store.replace(id, record.clone()) {
            // Removed between the lookup and the write.
            warn!(kind = R::KIND, id, "record vanished during update");
            return Err(CatalogError::not_found_id(R::KIND, id));
        }

        info!(kind = R::KIND, id, title = record.title(), "updated record");
        Ok(record)
    }

    pub fn delete(&self, id: u64) -> Result<(), CatalogError> {
        if !self.store.remove(id) {
            warn!(kind = R::KIND, id, "record not found for deletion");
            return Err(CatalogError::not_found_id(R::KIND, id));
        }
        info!(kind = R::KIND, id, "deleted record");
        Ok(())
    }
}

/// Both catalogs, wired from configuration.
#[derive(Clone)]
pub struct Catalogs {
    pub books: Arc<BookService>,
    pub todos: Arc<TodoService>,
}

#[derive(Debug)]
pub enum StartupError {
    Config(ConfigError),
    Store(StoreError),
}

impl std::fmt::Display for StartupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid config: {e}"),
            Self::Store(e) => write!(f, "invalid store seed: {e}"),
        }
    }
}

impl std::error::Error for StartupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Store(e) => Some(e),
        }
    }
}

impl From<ConfigError> for StartupError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<StoreError> for StartupError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl Catalogs {
    pub fn from_config(config: &Config) -> Result<Self, StartupError> {
        let now = Utc::now();

        let books = RecordStore::new(StoreInit {
            seed: seed_books(now),
            id_seed: config.book_id_seed,
        })?;
        let todos = RecordStore::new(StoreInit {
            seed: seed_todos(now),
            id_seed: config.todo_id_seed,
        })?;

        Ok(Self {
            books: Arc::new(CatalogService::new(Arc::new(books), config.book_limits()?)),
            todos: Arc::new(CatalogService::new(Arc::new(todos), config.todo_limits()?)),
        })
    }
}
