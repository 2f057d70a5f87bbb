//! Catalog store for books and patrons.
//!
//! The catalog owns record identity and attributes only; lending state
//! lives in the ledger. Removal is unconditional and carries no business
//! logic, so ledger records can legitimately point at vanished entities.

use crate::types::{Book, Patron};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// In-memory store of books and patrons, keyed by id
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CatalogStore {
    books: HashMap<String, Book>,
    patrons: HashMap<String, Patron>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a book record
    pub fn add_book(&mut self, book: Book) {
        tracing::debug!("Adding book {} ({})", book.id, book.title);
        self.books.insert(book.id.clone(), book);
    }

    /// Remove a book record, returning it if present
    pub fn remove_book(&mut self, id: &str) -> Option<Book> {
        let removed = self.books.remove(id);
        if removed.is_some() {
            tracing::debug!("Removed book {}", id);
        }
        removed
    }

    pub fn find_book(&self, id: &str) -> Option<&Book> {
        self.books.get(id)
    }

    /// Add or replace a patron record
    pub fn add_patron(&mut self, patron: Patron) {
        tracing::debug!("Adding patron {} ({})", patron.id, patron.name);
        self.patrons.insert(patron.id.clone(), patron);
    }

    /// Remove a patron record, returning it if present
    pub fn remove_patron(&mut self, id: &str) -> Option<Patron> {
        let removed = self.patrons.remove(id);
        if removed.is_some() {
            tracing::debug!("Removed patron {}", id);
        }
        removed
    }

    pub fn find_patron(&self, id: &str) -> Option<&Patron> {
        self.patrons.get(id)
    }

    pub fn find_patron_mut(&mut self, id: &str) -> Option<&mut Patron> {
        self.patrons.get_mut(id)
    }

    pub fn books(&self) -> impl Iterator<Item = &Book> {
        self.books.values()
    }

    pub fn patrons(&self) -> impl Iterator<Item = &Patron> {
        self.patrons.values()
    }

    pub fn book_count(&self) -> usize {
        self.books.len()
    }

    pub fn patron_count(&self) -> usize {
        self.patrons.len()
    }

    /// Case-insensitive substring search over book titles and authors.
    ///
    /// Results are sorted by id for deterministic output.
    pub fn search_books(&self, query: &str) -> Vec<&Book> {
        let needle = query.to_lowercase();
        let mut matches: Vec<_> = self
            .books
            .values()
            .filter(|b| {
                b.title.to_lowercase().contains(&needle)
                    || b.author.to_lowercase().contains(&needle)
            })
            .collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        matches
    }

    /// Case-insensitive substring search over patron names
    pub fn search_patrons(&self, query: &str) -> Vec<&Patron> {
        let needle = query.to_lowercase();
        let mut matches: Vec<_> = self
            .patrons
            .values()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        matches
    }
}
