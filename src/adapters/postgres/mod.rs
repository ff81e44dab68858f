pub mod book_repository;
pub mod loan_repository;

use crate::ports::store_error::{Constraint, StoreError};
use sqlx::{PgPool, Postgres, Transaction};

// パブリックに型を再エクスポート
pub use book_repository::BookRepository as PostgresBookRepository;
pub use loan_repository::LoanRepository as PostgresLoanRepository;

/// sqlxのエラーをストアポートのエラーに変換する
///
/// 既知の一意制約への違反のみ `UniqueViolation` とし、それ以外はすべて `Backend`。
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.is_unique_violation()
        && let Some(constraint) = db_err.constraint().and_then(Constraint::from_name)
    {
        return StoreError::UniqueViolation(constraint);
    }
    StoreError::backend(err)
}

/// 件数とページを同じスナップショットから読むためのトランザクションを開始する
pub(crate) async fn begin_snapshot(
    pool: &PgPool,
) -> Result<Transaction<'static, Postgres>, StoreError> {
    let mut tx = pool.begin().await.map_err(map_sqlx_error)?;

    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

    Ok(tx)
}

/// LIKE検索用に % _ \ をエスケープする
pub(crate) fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
