use crate::domain::{self, Book, BookFilter, BookId, Page, PageRequest, commands::*};
use crate::ports::{BookRepository, Constraint, StoreError};
use std::sync::Arc;

use super::errors::{CatalogApplicationError, Result};

/// カタログサービスの依存関係
#[derive(Clone)]
pub struct CatalogDependencies {
    pub book_repository: Arc<dyn BookRepository>,
}

/// ストアのエラーをアプリケーション層のエラーに変換する
///
/// ISBNの一意制約違反は事前チェックと同じ `DuplicateIsbn` にする。
fn map_store_error(err: StoreError) -> CatalogApplicationError {
    match err {
        StoreError::UniqueViolation(Constraint::UniqueIsbn) => {
            CatalogApplicationError::DuplicateIsbn
        }
        other => CatalogApplicationError::StoreError(other),
    }
}

/// 書籍を登録する
///
/// ビジネスルール：
/// - ISBNが未登録であること
///
/// 事前チェックと登録はアトミックではない。同時に同じISBNを登録した場合は
/// ストアの一意制約が負けた側を `DuplicateIsbn` として弾く。
#[tracing::instrument(skip(deps), fields(isbn = %cmd.isbn))]
pub async fn create_book(deps: &CatalogDependencies, cmd: CreateBook) -> Result<Book> {
    // 1. ISBNの重複確認
    let exists = deps
        .book_repository
        .exists_by_isbn(&cmd.isbn)
        .await
        .map_err(map_store_error)?;

    if exists {
        return Err(CatalogApplicationError::DuplicateIsbn);
    }

    // 2. 保存（一意制約違反も同じエラーになる）
    let book = deps
        .book_repository
        .insert(cmd.into())
        .await
        .map_err(map_store_error)?;

    tracing::info!(book_id = %book.book_id, "Book registered");
    Ok(book)
}

/// IDで書籍を取得する
///
/// 存在しない場合は `None`（エラーではない）。
pub async fn get_book(deps: &CatalogDependencies, book_id: BookId) -> Result<Option<Book>> {
    deps.book_repository
        .find_by_id(book_id)
        .await
        .map_err(map_store_error)
}

/// ISBNで書籍を取得する
pub async fn get_book_by_isbn(deps: &CatalogDependencies, isbn: &str) -> Result<Option<Book>> {
    deps.book_repository
        .find_by_isbn(isbn)
        .await
        .map_err(map_store_error)
}

/// 書籍のタイトルと著者を更新する
///
/// ISBNは変更されない。
#[tracing::instrument(skip(deps), fields(book_id = %cmd.book_id))]
pub async fn update_book(deps: &CatalogDependencies, cmd: UpdateBook) -> Result<Book> {
    let book = deps
        .book_repository
        .find_by_id(cmd.book_id)
        .await
        .map_err(map_store_error)?
        .ok_or(CatalogApplicationError::BookNotFound)?;

    let revised = domain::book::revise_book(&book, cmd.title, cmd.author);

    deps.book_repository
        .update(&revised)
        .await
        .map_err(map_store_error)?
        .ok_or(CatalogApplicationError::BookNotFound)
}

/// 書籍を削除する
///
/// 貸出中かどうかは確認しない。貸出履歴は書籍IDを保持したまま残る。
#[tracing::instrument(skip(deps))]
pub async fn delete_book(deps: &CatalogDependencies, book_id: BookId) -> Result<()> {
    let deleted = deps
        .book_repository
        .delete(book_id)
        .await
        .map_err(map_store_error)?;

    if !deleted {
        return Err(CatalogApplicationError::BookNotFound);
    }

    tracing::info!(%book_id, "Book deleted");
    Ok(())
}

/// 部分一致テンプレートで書籍を検索する
pub async fn find_books(
    deps: &CatalogDependencies,
    filter: BookFilter,
    page: PageRequest,
) -> Result<Page<Book>> {
    deps.book_repository
        .find_all(&filter, page)
        .await
        .map_err(map_store_error)
}
