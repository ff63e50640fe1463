//! In-memory record store.
//!
//! One store owns the collection of a single record kind together with the
//! counter that issues its ids. Every operation runs under a single coarse
//! lock, so ids are handed out strictly in sequence and readers never see a
//! half-applied write.

use std::{
    collections::BTreeSet,
    sync::{Mutex, MutexGuard, PoisonError},
};

use crate::domain::CatalogRecord;

/// Largest accepted id counter seed. Ids stay exact when a client parses
/// JSON numbers as doubles, and the counter cannot reach `u64::MAX`.
pub const MAX_ID_SEED: u64 = (1 << 53) - 1;

#[derive(Debug, Clone)]
pub struct StoreInit<R> {
    /// Initial collection, restored by [`RecordStore::reset`].
    pub seed: Vec<R>,
    /// Counter value before the first allocation; the first id issued is
    /// `id_seed + 1`.
    pub id_seed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    DuplicateSeedId { kind: &'static str, id: u64 },
    SeedIdAboveCounter {
        kind: &'static str,
        id: u64,
        id_seed: u64,
    },
    IdSeedTooLarge {
        kind: &'static str,
        id_seed: u64,
    },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateSeedId { kind, id } => {
                write!(f, "duplicate {kind} id in seed data: {id}")
            }
            Self::SeedIdAboveCounter { kind, id, id_seed } => write!(
                f,
                "{kind} seed id {id} is above the id counter seed {id_seed}; issued ids would collide"
            ),
            Self::IdSeedTooLarge { kind, id_seed } => write!(
                f,
                "{kind} id counter seed {id_seed} exceeds the maximum of {MAX_ID_SEED}"
            ),
        }
    }
}

impl std::error::Error for StoreError {}

struct StoreState<R> {
    records: Vec<R>,
    counter: u64,
}

pub struct RecordStore<R> {
    seed: Vec<R>,
    id_seed: u64,
    state: Mutex<StoreState<R>>,
}

impl<R: CatalogRecord> RecordStore<R> {
    pub fn new(init: StoreInit<R>) -> Result<Self, StoreError> {
        if init.id_seed > MAX_ID_SEED {
            return Err(StoreError::IdSeedTooLarge {
                kind: R::KIND,
                id_seed: init.id_seed,
            });
        }

        let mut seen = BTreeSet::new();
        for record in &init.seed {
            let id = record.id();
            if !seen.insert(id) {
                return Err(StoreError::DuplicateSeedId { kind: R::KIND, id });
            }
            if id > init.id_seed {
                return Err(StoreError::SeedIdAboveCounter {
                    kind: R::KIND,
                    id,
                    id_seed: init.id_seed,
                });
            }
        }

        Ok(Self {
            state: Mutex::new(StoreState {
                records: init.seed.clone(),
                counter: init.id_seed,
            }),
            seed: init.seed,
            id_seed: init.id_seed,
        })
    }

    fn lock(&self) -> MutexGuard<'_, StoreState<R>> {
        // Every mutation is a single push/assign/remove, so a panic elsewhere
        // cannot leave the state half-written.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issues the next id. Concurrent callers always observe distinct,
    /// consecutive values.
    pub fn allocate_id(&self) -> u64 {
        let mut state = self.lock();
        // `new` caps the seed at MAX_ID_SEED, far below u64::MAX.
        state.counter += 1;
        state.counter
    }

    pub fn list(&self, category: Option<&str>) -> Vec<R> {
        let state = self.lock();
        match category {
            Some(category) => state
                .records
                .iter()
                .filter(|r| r.in_category(category))
                .cloned()
                .collect(),
            None => state.records.clone(),
        }
    }

    pub fn find_by_id(&self, id: u64) -> Option<R> {
        self.lock().records.iter().find(|r| r.id() == id).cloned()
    }

    pub fn find_by_title(&self, title: &str) -> Option<R> {
        self.lock()
            .records
            .iter()
            .find(|r| r.has_title(title))
            .cloned()
    }

    /// Appends `record`. The id must come from [`Self::allocate_id`].
    pub fn insert(&self, record: R) -> R {
        self.lock().records.push(record.clone());
        record
    }

    /// Overwrites the record with `id` in place. Returns `false` and leaves
    /// the collection untouched when no such record exists.
    pub fn replace(&self, id: u64, record: R) -> bool {
        let mut state = self.lock();
        match state.records.iter_mut().find(|r| r.id() == id) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, id: u64) -> bool {
        let mut state = self.lock();
        match state.records.iter().position(|r| r.id() == id) {
            Some(index) => {
                state.records.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    /// Restores the seed collection and counter. Test isolation only.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.records = self.seed.clone();
        state.counter = self.id_seed;
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeSet, sync::Arc};

    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::domain::{Book, BookFields, seed_books};

    fn book_store() -> RecordStore<Book> {
        RecordStore::new(StoreInit {
            seed: seed_books(Utc::now()),
            id_seed: 100,
        })
        .unwrap()
    }

    fn book(id: u64, title: &str) -> Book {
        Book::create(
            id,
            BookFields {
                title: title.to_string(),
                author: "Test Author".to_string(),
                category: "Test".to_string(),
            },
            Utc::now(),
        )
    }

    fn ids(books: &[Book]) -> Vec<u64> {
        books.iter().map(|b| b.id).collect()
    }

    #[test]
    fn allocate_id_starts_after_seed() {
        let store = book_store();
        assert_eq!(store.allocate_id(), 101);
        assert_eq!(store.allocate_id(), 102);
    }

    #[test]
    fn concurrent_allocations_are_distinct_and_contiguous() {
        let store = Arc::new(book_store());
        let n = 64;

        let mut got: Vec<u64> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..n)
                .map(|_| {
                    let store = store.clone();
                    scope.spawn(move || store.allocate_id())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        got.sort_unstable();
        let expected: Vec<u64> = (101..=100 + n).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn concurrent_allocations_and_inserts_match_seed_plus_run() {
        let store = Arc::new(book_store());

        std::thread::scope(|scope| {
            for _ in 0..10 {
                let store = store.clone();
                scope.spawn(move || {
                    let id = store.allocate_id();
                    store.insert(book(id, "Concurrent Test Book"));
                });
            }
        });

        let got: BTreeSet<u64> = store.list(None).iter().map(|b| b.id).collect();
        let expected: BTreeSet<u64> = (1..=5).chain(101..=110).collect();
        assert_eq!(store.len(), 15);
        assert_eq!(got, expected);
    }

    #[test]
    fn list_filters_category_case_insensitively() {
        let store = book_store();
        let a = ids(&store.list(Some("Self-Help")));
        let b = ids(&store.list(Some("self-help")));
        let c = ids(&store.list(Some("SELF-HELP")));
        assert_eq!(a, vec![1, 3]);
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert!(store.list(Some("nonexistent")).is_empty());
        assert_eq!(store.list(None).len(), 5);
    }

    #[test]
    fn list_preserves_insertion_order() {
        let store = book_store();
        let id = store.allocate_id();
        store.insert(book(id, "Appended Book"));
        assert_eq!(ids(&store.list(None)), vec![1, 2, 3, 4, 5, 101]);
    }

    #[test]
    fn find_by_title_ignores_case() {
        let store = book_store();
        assert_eq!(store.find_by_title("Atomic Habits").unwrap().id, 1);
        assert_eq!(store.find_by_title("atomic habits").unwrap().id, 1);
        assert!(store.find_by_title("Atomic").is_none());
    }

    #[test]
    fn insert_then_remove_round_trip() {
        let store = book_store();
        let id = store.allocate_id();
        let inserted = store.insert(book(id, "Some New Book"));

        assert_eq!(store.find_by_id(id), Some(inserted));
        assert!(store.remove(id));
        assert_eq!(store.find_by_id(id), None);
        assert!(!store.remove(id));
    }

    #[test]
    fn replace_on_missing_id_is_a_no_op() {
        let store = book_store();
        let before = store.list(None);

        assert!(!store.replace(999, book(999, "Ghost Book")));
        assert_eq!(store.list(None), before);
    }

    #[test]
    fn replace_overwrites_in_place() {
        let store = book_store();
        assert!(store.replace(3, book(3, "Renamed Mountain")));
        let listed = store.list(None);
        assert_eq!(listed[2].title, "Renamed Mountain");
        assert_eq!(ids(&listed), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn reset_restores_seed_and_counter() {
        let store = book_store();
        let seed = store.list(None);

        let id = store.allocate_id();
        store.insert(book(id, "Temporary Book"));
        store.remove(1);
        store.replace(2, book(2, "Changed"));

        store.reset();

        assert!(!store.is_empty());
        assert_eq!(store.list(None), seed);
        assert_eq!(store.allocate_id(), 101);
    }

    #[test]
    fn rejects_seed_ids_above_counter() {
        let err = RecordStore::new(StoreInit {
            seed: seed_books(Utc::now()),
            id_seed: 3,
        })
        .err()
        .unwrap();
        assert_eq!(
            err,
            StoreError::SeedIdAboveCounter {
                kind: "book",
                id: 4,
                id_seed: 3,
            }
        );
    }

    #[test]
    fn rejects_id_seed_near_u64_max() {
        for id_seed in [u64::MAX, MAX_ID_SEED + 1] {
            let err = RecordStore::new(StoreInit {
                seed: seed_books(Utc::now()),
                id_seed,
            })
            .err()
            .unwrap();
            assert_eq!(err, StoreError::IdSeedTooLarge { kind: "book", id_seed });
        }
    }

    #[test]
    fn largest_id_seed_still_allocates() {
        let store = RecordStore::new(StoreInit {
            seed: seed_books(Utc::now()),
            id_seed: MAX_ID_SEED,
        })
        .unwrap();
        assert_eq!(store.allocate_id(), MAX_ID_SEED + 1);
        assert_eq!(store.allocate_id(), MAX_ID_SEED + 2);
    }

    #[test]
    fn rejects_duplicate_seed_ids() {
        let mut seed = seed_books(Utc::now());
        seed[1].id = 1;
        let err = RecordStore::new(StoreInit { seed, id_seed: 100 })
            .err()
            .unwrap();
        assert_eq!(err, StoreError::DuplicateSeedId { kind: "book", id: 1 });
    }
}
