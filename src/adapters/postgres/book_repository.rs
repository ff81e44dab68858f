use crate::domain::{Book, BookFilter, BookId, NewBook, Page, PageRequest};
use crate::ports::book_repository::BookRepository as BookRepositoryTrait;
use crate::ports::store_error::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use super::{begin_snapshot, escape_like, map_sqlx_error};

/// PostgreSQLの行データをBookに変換する
fn map_row_to_book(row: &PgRow) -> Book {
    Book {
        book_id: BookId::from_uuid(row.get("id")),
        title: row.get("title"),
        author: row.get("author"),
        isbn: row.get("isbn"),
    }
}

fn like_pattern(value: Option<&str>) -> Option<String> {
    value.map(|v| format!("%{}%", escape_like(v)))
}

/// BookRepositoryのPostgreSQL実装
///
/// ISBNの一意性は `books_isbn_key` 制約で保証する。
pub struct BookRepository {
    pool: PgPool,
}

impl BookRepository {
    /// PostgreSQLコネクションプールから新しいBookRepositoryを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepositoryTrait for BookRepository {
    async fn exists_by_isbn(&self, isbn: &str) -> Result<bool> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM books WHERE isbn = $1)")
            .bind(isbn)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    /// 書籍を登録（IDはデータベースが採番）
    ///
    /// 同時登録で負けた側は一意制約違反になる。
    async fn insert(&self, book: NewBook) -> Result<Book> {
        let row = sqlx::query(
            r#"
            INSERT INTO books (title, author, isbn)
            VALUES ($1, $2, $3)
            RETURNING id, title, author, isbn
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(map_row_to_book(&row))
    }

    async fn update(&self, book: &Book) -> Result<Option<Book>> {
        let row = sqlx::query(
            r#"
            UPDATE books
            SET title = $2, author = $3
            WHERE id = $1
            RETURNING id, title, author, isbn
            "#,
        )
        .bind(book.book_id.value())
        .bind(&book.title)
        .bind(&book.author)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.as_ref().map(map_row_to_book))
    }

    async fn find_by_id(&self, book_id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query("SELECT id, title, author, isbn FROM books WHERE id = $1")
            .bind(book_id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.as_ref().map(map_row_to_book))
    }

    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>> {
        let row = sqlx::query("SELECT id, title, author, isbn FROM books WHERE isbn = $1")
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.as_ref().map(map_row_to_book))
    }

    async fn delete(&self, book_id: BookId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(book_id.value())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    /// 部分一致検索（ILIKE）。件数とページを同じ条件で取得する
    async fn find_all(&self, filter: &BookFilter, page: PageRequest) -> Result<Page<Book>> {
        let title = like_pattern(filter.title.as_deref());
        let author = like_pattern(filter.author.as_deref());
        let isbn = like_pattern(filter.isbn.as_deref());

        let mut tx = begin_snapshot(&self.pool).await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM books
            WHERE ($1::text IS NULL OR title ILIKE $1)
              AND ($2::text IS NULL OR author ILIKE $2)
              AND ($3::text IS NULL OR isbn ILIKE $3)
            "#,
        )
        .bind(&title)
        .bind(&author)
        .bind(&isbn)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let rows = sqlx::query(
            r#"
            SELECT id, title, author, isbn
            FROM books
            WHERE ($1::text IS NULL OR title ILIKE $1)
              AND ($2::text IS NULL OR author ILIKE $2)
              AND ($3::text IS NULL OR isbn ILIKE $3)
            ORDER BY id
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(&title)
        .bind(&author)
        .bind(&isbn)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        let content = rows.iter().map(map_row_to_book).collect();
        Ok(Page::new(content, page, total.max(0) as u64))
    }
}
