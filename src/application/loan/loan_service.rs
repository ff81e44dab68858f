use crate::domain::{self, Loan, LoanId, Page, PageRequest, ReturnLoanError, commands::*};
use crate::ports::*;
use chrono::NaiveDate;
use futures::TryStreamExt;
use std::sync::Arc;

use super::errors::{LoanApplicationError, Result};

/// サービスの依存関係
///
/// データ構造として定義し、振る舞いは持たない。
/// 各ユースケースは関数として依存関係を受け取る。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub book_repository: Arc<dyn BookRepository>,
    pub loan_repository: Arc<dyn LoanRepository>,
    pub notification_gateway: Arc<dyn NotificationGateway>,
}

/// ストアのエラーをアプリケーション層のエラーに変換する
///
/// 「貸出中は1件まで」の制約違反は事前チェックと同じ `BookAlreadyLoaned` にする。
/// 呼び出し側から競合負けと事前チェック失敗は区別できない。
fn map_store_error(err: StoreError) -> LoanApplicationError {
    match err {
        StoreError::UniqueViolation(Constraint::OneActiveLoanPerBook) => {
            LoanApplicationError::BookAlreadyLoaned
        }
        other => LoanApplicationError::StoreError(other),
    }
}

/// 書籍を貸し出す
///
/// ビジネスルール：
/// - 書籍が存在すること
/// - 書籍に未返却の貸出がないこと
///
/// # 一貫性保証
///
/// 事前チェックは早期失敗のための最適化であり、唯一の保証ではない。
/// 同じ書籍への同時貸出はストアの部分一意インデックスで直列化され、
/// 負けた側は `BookAlreadyLoaned` になる。
#[tracing::instrument(skip(deps), fields(book_id = %cmd.book_id))]
pub async fn create_loan(deps: &ServiceDependencies, cmd: CreateLoan) -> Result<Loan> {
    // 1. 書籍の存在確認
    let book = deps
        .book_repository
        .find_by_id(cmd.book_id)
        .await
        .map_err(map_store_error)?;

    if book.is_none() {
        return Err(LoanApplicationError::BookNotFound);
    }

    // 2. 貸出中の確認
    let already_loaned = deps
        .loan_repository
        .exists_active_loan_for_book(cmd.book_id)
        .await
        .map_err(map_store_error)?;

    if already_loaned {
        return Err(LoanApplicationError::BookAlreadyLoaned);
    }

    // 3. ドメイン層の純粋関数を呼び出し、保存
    let loan = deps
        .loan_repository
        .insert(domain::loan::open_loan(cmd))
        .await
        .map_err(map_store_error)?;

    tracing::info!(loan_id = %loan.loan_id, "Loan created");
    Ok(loan)
}

/// 書籍を返却する
///
/// ビジネスルール：
/// - 貸出が存在すること
/// - 既に返却済みでないこと（二重返却はエラー）
#[tracing::instrument(skip(deps), fields(loan_id = %cmd.loan_id))]
pub async fn return_loan(deps: &ServiceDependencies, cmd: ReturnLoan) -> Result<Loan> {
    // 1. 貸出を取得
    let loan = deps
        .loan_repository
        .find_by_id(cmd.loan_id)
        .await
        .map_err(map_store_error)?
        .ok_or(LoanApplicationError::LoanNotFound)?;

    // 2. ドメイン層で状態遷移を検証
    domain::loan::return_loan(&loan).map_err(|e| match e {
        ReturnLoanError::AlreadyReturned => LoanApplicationError::AlreadyReturned,
    })?;

    // 3. 条件付き更新（同時返却の負け側は AlreadyReturned）
    let returned = deps
        .loan_repository
        .mark_returned(cmd.loan_id)
        .await
        .map_err(map_store_error)?
        .ok_or(LoanApplicationError::AlreadyReturned)?;

    tracing::info!("Loan returned");
    Ok(returned)
}

/// IDで貸出を取得する
pub async fn get_loan(deps: &ServiceDependencies, loan_id: LoanId) -> Result<Option<Loan>> {
    deps.loan_repository
        .find_by_id(loan_id)
        .await
        .map_err(map_store_error)
}

/// ISBNまたは利用者で貸出を検索する（OR結合）
pub async fn find_loans(
    deps: &ServiceDependencies,
    filter: LoanFilter,
    page: PageRequest,
) -> Result<Page<Loan>> {
    deps.loan_repository
        .find_by_isbn_or_customer(&filter, page)
        .await
        .map_err(map_store_error)
}

/// 延滞中の貸出を取得する
///
/// loan_date < threshold かつ未返却の貸出。基準日と同日の貸出は含まない。
pub async fn find_overdue(deps: &ServiceDependencies, threshold: NaiveDate) -> Result<Vec<Loan>> {
    deps.loan_repository
        .find_overdue(threshold)
        .try_collect()
        .await
        .map_err(map_store_error)
}

