use crate::domain::{BookId, Loan, LoanId, NewLoan, Page, PageRequest};
use crate::ports::loan_repository::{LoanFilter, LoanRepository as LoanRepositoryTrait};
use crate::ports::store_error::{Constraint, Result, StoreError};
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;

use super::MemoryDatabase;

/// LoanRepositoryのインメモリ実装
///
/// ISBNでの検索のため、書籍テーブルと同じデータベースを共有する。
pub struct LoanRepository {
    db: Arc<MemoryDatabase>,
}

impl LoanRepository {
    pub fn new(db: Arc<MemoryDatabase>) -> Self {
        Self { db }
    }

    fn overdue_loans(&self, threshold: NaiveDate) -> Result<Vec<Loan>> {
        let tables = self.db.lock()?;

        let mut loans: Vec<Loan> = tables
            .loans
            .values()
            .filter(|loan| crate::domain::loan::is_overdue(loan, threshold))
            .cloned()
            .collect();
        loans.sort_by(|a, b| (a.loan_date, a.loan_id).cmp(&(b.loan_date, b.loan_id)));

        Ok(loans)
    }
}

#[async_trait]
impl LoanRepositoryTrait for LoanRepository {
    async fn exists_active_loan_for_book(&self, book_id: BookId) -> Result<bool> {
        Ok(self.db.lock()?.has_active_loan(book_id))
    }

    /// 「1冊につき貸出中は1件まで」を検査してから登録する
    async fn insert(&self, loan: NewLoan) -> Result<Loan> {
        let mut tables = self.db.lock()?;

        if tables.has_active_loan(loan.book_id) {
            return Err(StoreError::UniqueViolation(Constraint::OneActiveLoanPerBook));
        }

        let loan = Loan {
            loan_id: LoanId::new(),
            book_id: loan.book_id,
            customer: loan.customer,
            customer_email: loan.customer_email,
            loan_date: loan.loan_date,
            returned: false,
        };
        tables.loans.insert(loan.loan_id, loan.clone());

        Ok(loan)
    }

    async fn mark_returned(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        let mut tables = self.db.lock()?;

        Ok(tables
            .loans
            .get_mut(&loan_id)
            .filter(|loan| loan.is_active())
            .map(|loan| {
                loan.returned = true;
                loan.clone()
            }))
    }

    async fn find_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        Ok(self.db.lock()?.loans.get(&loan_id).cloned())
    }

    async fn find_by_isbn_or_customer(
        &self,
        filter: &LoanFilter,
        page: PageRequest,
    ) -> Result<Page<Loan>> {
        let tables = self.db.lock()?;

        let matched = tables
            .loans
            .values()
            .filter(|loan| {
                let isbn = tables.books.get(&loan.book_id).map(|book| book.isbn.as_str());
                filter.matches(loan, isbn)
            })
            .cloned()
            .collect();

        Ok(Page::from_sorted(matched, page))
    }

    fn find_overdue(&self, threshold: NaiveDate) -> BoxStream<'_, Result<Loan>> {
        match self.overdue_loans(threshold) {
            Ok(loans) => stream::iter(loans.into_iter().map(Ok)).boxed(),
            Err(e) => stream::once(async move { Err(e) }).boxed(),
        }
    }
}
