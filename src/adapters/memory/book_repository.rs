use crate::domain::{Book, BookFilter, BookId, NewBook, Page, PageRequest};
use crate::ports::book_repository::BookRepository as BookRepositoryTrait;
use crate::ports::store_error::{Constraint, Result, StoreError};
use async_trait::async_trait;
use std::sync::Arc;

use super::MemoryDatabase;

/// BookRepositoryのインメモリ実装
pub struct BookRepository {
    db: Arc<MemoryDatabase>,
}

impl BookRepository {
    pub fn new(db: Arc<MemoryDatabase>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookRepositoryTrait for BookRepository {
    async fn exists_by_isbn(&self, isbn: &str) -> Result<bool> {
        Ok(self.db.lock()?.isbn_taken(isbn))
    }

    /// ISBNの一意制約を検査してから登録する
    async fn insert(&self, book: NewBook) -> Result<Book> {
        let mut tables = self.db.lock()?;

        if tables.isbn_taken(&book.isbn) {
            return Err(StoreError::UniqueViolation(Constraint::UniqueIsbn));
        }

        let book = Book {
            book_id: BookId::new(),
            title: book.title,
            author: book.author,
            isbn: book.isbn,
        };
        tables.books.insert(book.book_id, book.clone());

        Ok(book)
    }

    async fn update(&self, book: &Book) -> Result<Option<Book>> {
        let mut tables = self.db.lock()?;

        Ok(tables.books.get_mut(&book.book_id).map(|stored| {
            stored.title = book.title.clone();
            stored.author = book.author.clone();
            stored.clone()
        }))
    }

    async fn find_by_id(&self, book_id: BookId) -> Result<Option<Book>> {
        Ok(self.db.lock()?.books.get(&book_id).cloned())
    }

    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>> {
        Ok(self
            .db
            .lock()?
            .books
            .values()
            .find(|book| book.isbn == isbn)
            .cloned())
    }

    async fn delete(&self, book_id: BookId) -> Result<bool> {
        Ok(self.db.lock()?.books.remove(&book_id).is_some())
    }

    async fn find_all(&self, filter: &BookFilter, page: PageRequest) -> Result<Page<Book>> {
        let tables = self.db.lock()?;

        // BTreeMapのためID順
        let matched = tables
            .books
            .values()
            .filter(|book| filter.matches(book))
            .cloned()
            .collect();

        Ok(Page::from_sorted(matched, page))
    }
}
