pub mod book_repository;
pub mod loan_repository;

use crate::domain::{Book, BookId, Loan, LoanId};
use crate::ports::StoreError;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

pub use book_repository::BookRepository as MemoryBookRepository;
pub use loan_repository::LoanRepository as MemoryLoanRepository;

/// インメモリのテーブル群
#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub books: BTreeMap<BookId, Book>,
    pub loans: BTreeMap<LoanId, Loan>,
}

impl Tables {
    pub fn isbn_taken(&self, isbn: &str) -> bool {
        self.books.values().any(|book| book.isbn == isbn)
    }

    pub fn has_active_loan(&self, book_id: BookId) -> bool {
        self.loans
            .values()
            .any(|loan| loan.book_id == book_id && loan.is_active())
    }
}

/// 書籍と貸出を保持するインメモリストア
///
/// 1つのMutexで全テーブルを守ることで、各操作をトランザクションとして扱う。
/// PostgreSQLと同じ2つの制約（ISBNの一意性、1冊につき貸出中は1件まで）を
/// 書き込み時に検査する。
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    tables: Mutex<Tables>,
}

impl MemoryDatabase {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|e| StoreError::backend(format!("memory store poisoned: {}", e)))
    }
}

/// 同じデータベースを共有する書籍・貸出ストアを作成する
pub fn repositories() -> (Arc<MemoryBookRepository>, Arc<MemoryLoanRepository>) {
    let db = MemoryDatabase::new();
    (
        Arc::new(MemoryBookRepository::new(db.clone())),
        Arc::new(MemoryLoanRepository::new(db)),
    )
}
