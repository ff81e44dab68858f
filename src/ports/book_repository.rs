use crate::domain::{Book, BookFilter, BookId, NewBook, Page, PageRequest};
use async_trait::async_trait;

use super::store_error::Result;

/// カタログストアポート
///
/// 書籍の永続化を抽象化する。
/// ISBNの一意性はストア側の制約で最終的に保証し、違反時は
/// `StoreError::UniqueViolation(Constraint::UniqueIsbn)` を返す。
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// ISBNが登録済みか確認する
    async fn exists_by_isbn(&self, isbn: &str) -> Result<bool>;

    /// 書籍を新規登録し、採番されたIDを含む書籍を返す
    async fn insert(&self, book: NewBook) -> Result<Book>;

    /// タイトルと著者を保存する
    ///
    /// 対象が存在しない場合は `None`。ISBNは変更しない。
    async fn update(&self, book: &Book) -> Result<Option<Book>>;

    async fn find_by_id(&self, book_id: BookId) -> Result<Option<Book>>;

    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>>;

    /// 書籍を削除する。削除した場合は `true`
    async fn delete(&self, book_id: BookId) -> Result<bool>;

    /// テンプレートに一致する書籍をID順でページング取得する
    async fn find_all(&self, filter: &BookFilter, page: PageRequest) -> Result<Page<Book>>;
}
