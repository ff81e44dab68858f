use crate::domain::{BookId, Loan, LoanId, NewLoan, Page, PageRequest};
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream::BoxStream;

use super::store_error::Result;

/// 貸出検索条件
///
/// 書籍のISBNが `isbn` に一致する、または利用者が `customer` に一致する貸出を対象とする（OR結合）。
/// 両方とも未設定の場合は全件。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoanFilter {
    pub isbn: Option<String>,
    pub customer: Option<String>,
}

impl LoanFilter {
    /// 1つの値をISBNと利用者の両方に当てはめる
    pub fn isbn_or_customer(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            isbn: Some(value.clone()),
            customer: Some(value),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.isbn.is_none() && self.customer.is_none()
    }

    /// 貸出（とその書籍のISBN）が条件に一致するか
    pub fn matches(&self, loan: &Loan, book_isbn: Option<&str>) -> bool {
        if self.is_empty() {
            return true;
        }
        let isbn_match = matches!((self.isbn.as_deref(), book_isbn), (Some(a), Some(b)) if a == b);
        let customer_match = self.customer.as_deref() == Some(loan.customer.as_str());
        isbn_match || customer_match
    }
}

/// 貸出ストアポート
///
/// 「1冊につき未返却の貸出は1件まで」はストア側の制約で最終的に保証し、違反時は
/// `StoreError::UniqueViolation(Constraint::OneActiveLoanPerBook)` を返す。
#[async_trait]
pub trait LoanRepository: Send + Sync {
    /// 書籍に未返却の貸出があるか確認する
    async fn exists_active_loan_for_book(&self, book_id: BookId) -> Result<bool>;

    /// 貸出を新規登録し、採番されたIDを含む貸出を返す
    async fn insert(&self, loan: NewLoan) -> Result<Loan>;

    /// 未返却の貸出を返却済みにする
    ///
    /// 条件付き更新であり、対象が存在しないか既に返却済みなら `None`。
    async fn mark_returned(&self, loan_id: LoanId) -> Result<Option<Loan>>;

    async fn find_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>>;

    /// ISBNまたは利用者で貸出をID順にページング取得する
    async fn find_by_isbn_or_customer(
        &self,
        filter: &LoanFilter,
        page: PageRequest,
    ) -> Result<Page<Loan>>;

    /// loan_date < threshold かつ未返却の貸出を (loan_date, id) 順に返す
    ///
    /// 呼び出すたびに最初から読み直す有限のストリーム。
    fn find_overdue(&self, threshold: NaiveDate) -> BoxStream<'_, Result<Loan>>;
}
