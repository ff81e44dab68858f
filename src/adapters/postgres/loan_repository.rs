use crate::domain::{BookId, Loan, LoanId, NewLoan, Page, PageRequest};
use crate::ports::loan_repository::{LoanFilter, LoanRepository as LoanRepositoryTrait};
use crate::ports::store_error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream::{BoxStream, StreamExt};
use sqlx::{PgPool, Row, postgres::PgRow};

use super::{begin_snapshot, map_sqlx_error};

/// PostgreSQLの行データをLoanに変換する
fn map_row_to_loan(row: &PgRow) -> Loan {
    Loan {
        loan_id: LoanId::from_uuid(row.get("id")),
        book_id: BookId::from_uuid(row.get("book_id")),
        customer: row.get("customer"),
        customer_email: row.get("customer_email"),
        loan_date: row.get("loan_date"),
        returned: row.get("returned"),
    }
}

/// LoanRepositoryのPostgreSQL実装
///
/// 「1冊につき貸出中は1件まで」は部分一意インデックス
/// `loans_one_active_per_book`（book_id WHERE NOT returned）で保証する。
pub struct LoanRepository {
    pool: PgPool,
}

impl LoanRepository {
    /// PostgreSQLコネクションプールから新しいLoanRepositoryを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanRepositoryTrait for LoanRepository {
    async fn exists_active_loan_for_book(&self, book_id: BookId) -> Result<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM loans WHERE book_id = $1 AND NOT returned)",
        )
        .bind(book_id.value())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    /// 貸出を登録（IDはデータベースが採番）
    ///
    /// 同じ書籍への同時貸出で負けた側は部分一意インデックス違反になる。
    async fn insert(&self, loan: NewLoan) -> Result<Loan> {
        let row = sqlx::query(
            r#"
            INSERT INTO loans (book_id, customer, customer_email, loan_date, returned)
            VALUES ($1, $2, $3, $4, FALSE)
            RETURNING id, book_id, customer, customer_email, loan_date, returned
            "#,
        )
        .bind(loan.book_id.value())
        .bind(&loan.customer)
        .bind(&loan.customer_email)
        .bind(loan.loan_date)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(map_row_to_loan(&row))
    }

    /// 未返却の場合のみ返却済みにする（条件付き更新）
    async fn mark_returned(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        let row = sqlx::query(
            r#"
            UPDATE loans
            SET returned = TRUE
            WHERE id = $1 AND NOT returned
            RETURNING id, book_id, customer, customer_email, loan_date, returned
            "#,
        )
        .bind(loan_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.as_ref().map(map_row_to_loan))
    }

    async fn find_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        let row = sqlx::query(
            r#"
            SELECT id, book_id, customer, customer_email, loan_date, returned
            FROM loans
            WHERE id = $1
            "#,
        )
        .bind(loan_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.as_ref().map(map_row_to_loan))
    }

    /// ISBN（書籍との結合）または利用者で検索する
    ///
    /// 書籍が削除された貸出は利用者でのみ一致する（LEFT JOIN）。
    async fn find_by_isbn_or_customer(
        &self,
        filter: &LoanFilter,
        page: PageRequest,
    ) -> Result<Page<Loan>> {
        let mut tx = begin_snapshot(&self.pool).await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM loans l
            LEFT JOIN books b ON b.id = l.book_id
            WHERE ($1::text IS NULL AND $2::text IS NULL)
               OR b.isbn = $1
               OR l.customer = $2
            "#,
        )
        .bind(&filter.isbn)
        .bind(&filter.customer)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let rows = sqlx::query(
            r#"
            SELECT l.id, l.book_id, l.customer, l.customer_email, l.loan_date, l.returned
            FROM loans l
            LEFT JOIN books b ON b.id = l.book_id
            WHERE ($1::text IS NULL AND $2::text IS NULL)
               OR b.isbn = $1
               OR l.customer = $2
            ORDER BY l.id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&filter.isbn)
        .bind(&filter.customer)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        let content = rows.iter().map(map_row_to_loan).collect();
        Ok(Page::new(content, page, total.max(0) as u64))
    }

    /// 延滞候補をストリームで返す
    ///
    /// (returned, loan_date) の部分インデックスを使用する。
    fn find_overdue(&self, threshold: NaiveDate) -> BoxStream<'_, Result<Loan>> {
        sqlx::query(
            r#"
            SELECT id, book_id, customer, customer_email, loan_date, returned
            FROM loans
            WHERE NOT returned AND loan_date < $1
            ORDER BY loan_date, id
            "#,
        )
        .bind(threshold)
        .fetch(&self.pool)
        .map(|row| row.map(|row| map_row_to_loan(&row)).map_err(map_sqlx_error))
        .boxed()
    }
}
