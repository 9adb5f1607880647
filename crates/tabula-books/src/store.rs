//! In-memory book storage.

use crate::isbn::Isbn;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tabula_contract::SortDirection;
use thiserror::Error;
use tracing::{debug, warn};

/// Seed catalog shipped with the binary.
const SEED_BOOKS: &str = include_str!("../data/books.json");

/// Storage failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No book with this id.
    #[error("book {0} not found")]
    NotFound(i64),

    /// Another book already has this ISBN.
    #[error("ISBN {0} is already taken")]
    DuplicateIsbn(Isbn),

    /// The seed file could not be parsed.
    #[error("invalid seed data: {0}")]
    Seed(#[from] serde_json::Error),
}

/// A stored book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    /// Identifier, assigned on creation.
    pub id: i64,
    /// Title.
    pub title: String,
    /// ISBN-13.
    pub isbn: Isbn,
    /// Author.
    pub author: String,
    /// Publication year, when known.
    pub year_published: Option<i64>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Fields of a book to create.
#[derive(Debug, Clone)]
pub struct NewBook {
    /// Title.
    pub title: String,
    /// Author.
    pub author: String,
    /// ISBN-13.
    pub isbn: Isbn,
    /// Publication year.
    pub year_published: Option<i64>,
}

/// Partial update. `None` leaves a field unchanged; for `year_published`,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct BookPatch {
    /// New title.
    pub title: Option<String>,
    /// New author.
    pub author: Option<String>,
    /// New ISBN.
    pub isbn: Option<Isbn>,
    /// New publication year.
    pub year_published: Option<Option<i64>>,
}

/// Filters for listing books.
#[derive(Debug, Clone, Default)]
pub struct BookQuery {
    /// Case-insensitive substring of the title or the author.
    pub text: Option<String>,
    /// Exact publication year.
    pub year_published: Option<i64>,
}

impl BookQuery {
    fn matches(&self, book: &Book) -> bool {
        if let Some(year) = self.year_published {
            if book.year_published != Some(year) {
                return false;
            }
        }
        self.text.as_deref().map_or(true, |text| {
            let needle = text.to_lowercase();
            book.title.to_lowercase().contains(&needle)
                || book.author.to_lowercase().contains(&needle)
        })
    }
}

#[derive(Debug, Deserialize)]
struct SeedBook {
    title: String,
    author: String,
    year_published: Option<i64>,
    isbn: String,
}

#[derive(Debug, Default)]
struct Inner {
    books: BTreeMap<i64, Book>,
    next_id: i64,
}

impl Inner {
    fn isbn_owner(&self, isbn: &Isbn) -> Option<i64> {
        self.books
            .values()
            .find(|book| &book.isbn == isbn)
            .map(|book| book.id)
    }
}

/// Thread-safe book storage.
#[derive(Debug, Default)]
pub struct BookStore {
    inner: RwLock<Inner>,
}

impl BookStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the bundled seed catalog.
    pub fn seeded() -> Result<Self, StoreError> {
        let store = Self::new();
        store.seed_from_json(SEED_BOOKS)?;
        Ok(store)
    }

    /// Adds the books of a JSON array, skipping invalid ISBNs and duplicates.
    /// Returns how many were added.
    pub fn seed_from_json(&self, json: &str) -> Result<usize, StoreError> {
        let seeds: Vec<SeedBook> = serde_json::from_str(json)?;
        let mut added = 0;
        for seed in seeds {
            let isbn = match Isbn::try_from_str(&seed.isbn) {
                Ok(isbn) => isbn,
                Err(e) => {
                    warn!(isbn = %seed.isbn, error = %e, "skipping seed book");
                    continue;
                }
            };
            let book = NewBook {
                title: seed.title,
                author: seed.author,
                isbn,
                year_published: seed.year_published,
            };
            match self.create(book) {
                Ok(_) => added += 1,
                Err(StoreError::DuplicateIsbn(isbn)) => {
                    debug!(%isbn, "skipping duplicate seed book");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(added)
    }

    /// Stores a new book.
    pub fn create(&self, book: NewBook) -> Result<Book, StoreError> {
        let mut inner = self.inner.write();
        if inner.isbn_owner(&book.isbn).is_some() {
            return Err(StoreError::DuplicateIsbn(book.isbn));
        }
        inner.next_id += 1;
        let book = Book {
            id: inner.next_id,
            title: book.title,
            isbn: book.isbn,
            author: book.author,
            year_published: book.year_published,
            created_at: Utc::now(),
        };
        inner.books.insert(book.id, book.clone());
        Ok(book)
    }

    /// Looks a book up by id.
    #[must_use]
    pub fn get(&self, id: i64) -> Option<Book> {
        self.inner.read().books.get(&id).cloned()
    }

    /// Applies `patch` to book `id`.
    pub fn update(&self, id: i64, patch: BookPatch) -> Result<Book, StoreError> {
        let mut inner = self.inner.write();
        if !inner.books.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        if let Some(isbn) = &patch.isbn {
            if inner.isbn_owner(isbn).is_some_and(|owner| owner != id) {
                return Err(StoreError::DuplicateIsbn(isbn.clone()));
            }
        }

        let book = inner.books.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if let Some(title) = patch.title {
            book.title = title;
        }
        if let Some(author) = patch.author {
            book.author = author;
        }
        if let Some(isbn) = patch.isbn {
            book.isbn = isbn;
        }
        if let Some(year) = patch.year_published {
            book.year_published = year;
        }
        Ok(book.clone())
    }

    /// Removes book `id`.
    pub fn delete(&self, id: i64) -> Result<Book, StoreError> {
        self.inner
            .write()
            .books
            .remove(&id)
            .ok_or(StoreError::NotFound(id))
    }

    /// Number of books matching `query`.
    #[must_use]
    pub fn count(&self, query: &BookQuery) -> u64 {
        let inner = self.inner.read();
        inner.books.values().filter(|b| query.matches(b)).count() as u64
    }

    /// One page of the books matching `query`, sorted by `column`.
    ///
    /// Unknown columns sort by id. Missing years sort after every year
    /// ascending and before every year descending. Ties break by id in the
    /// same direction.
    #[must_use]
    pub fn page(
        &self,
        query: &BookQuery,
        column: &str,
        direction: SortDirection,
        offset: u64,
        limit: u64,
    ) -> Vec<Book> {
        let inner = self.inner.read();
        let mut books: Vec<&Book> = inner.books.values().filter(|b| query.matches(b)).collect();
        books.sort_by(|a, b| {
            let ordering = compare(a, b, column).then_with(|| a.id.cmp(&b.id));
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        books
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Total number of stored books.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().books.len()
    }

    /// Returns `true` when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn compare(a: &Book, b: &Book, column: &str) -> Ordering {
    match column {
        "title" => a.title.cmp(&b.title),
        "author" => a.author.cmp(&b.author),
        "isbn" => a.isbn.cmp(&b.isbn),
        "year_published" => match (a.year_published, b.year_published) {
            (Some(x), Some(y)) => x.cmp(&y),
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
        },
        _ => a.id.cmp(&b.id),
    }
}
