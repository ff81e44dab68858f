use crate::ports::StoreError;
use thiserror::Error;

/// カタログ管理アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum CatalogApplicationError {
    /// ISBNが既に登録されている
    #[error("ISBN already registered")]
    DuplicateIsbn,

    /// 書籍が見つからない
    #[error("Book not found")]
    BookNotFound,

    /// ストアのエラー（制約違反以外）
    #[error("Catalog store error")]
    StoreError(#[source] StoreError),
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, CatalogApplicationError>;
