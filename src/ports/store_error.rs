use thiserror::Error;

/// ストアが永続的に保証する制約
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// 書籍のISBNは一意
    UniqueIsbn,
    /// 1冊につき未返却の貸出は1件まで
    OneActiveLoanPerBook,
}

impl Constraint {
    /// データベース上の制約名
    pub fn name(&self) -> &'static str {
        match self {
            Constraint::UniqueIsbn => "books_isbn_key",
            Constraint::OneActiveLoanPerBook => "loans_one_active_per_book",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "books_isbn_key" => Some(Constraint::UniqueIsbn),
            "loans_one_active_per_book" => Some(Constraint::OneActiveLoanPerBook),
            _ => None,
        }
    }
}

/// ストアポートのエラー
///
/// 制約違反（競合に負けた書き込み）と、接続断などのそれ以外の障害を区別する。
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {}", .0.name())]
    UniqueViolation(Constraint),

    #[error("store backend error")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn backend(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        StoreError::Backend(err.into())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
