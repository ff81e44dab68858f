use crate::ports::StoreError;
use thiserror::Error;

/// 貸出管理アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum LoanApplicationError {
    /// 書籍が存在しない
    #[error("Book not found")]
    BookNotFound,

    /// 書籍が既に貸出中
    #[error("Book already loaned")]
    BookAlreadyLoaned,

    /// 貸出が見つからない
    #[error("Loan not found")]
    LoanNotFound,

    /// 既に返却済み
    #[error("Loan already returned")]
    AlreadyReturned,

    /// ストアのエラー（制約違反以外）
    #[error("Loan store error")]
    StoreError(#[source] StoreError),
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LoanApplicationError>;
