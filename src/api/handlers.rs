use crate::application::catalog::{self, CatalogDependencies};
use crate::application::loan::{self, ServiceDependencies};
use crate::domain::{BookId, LoanId, commands::ReturnLoan};
use axum::{Json, extract::State, http::StatusCode};
use std::sync::Arc;
use uuid::Uuid;

use super::{
    error::ApiError,
    extract::{JsonBody, PathParam, QueryParams},
    types::{
        BookResponse, CreateBookRequest, CreateLoanRequest, ListBooksQuery, ListLoansQuery,
        LoanResponse, PageResponse, UpdateBookRequest,
    },
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogDependencies,
    pub loans: ServiceDependencies,
}

// ============================================================================
// Book handlers
// ============================================================================

/// POST /api/books - 書籍を登録
///
/// 強制されるビジネスルール:
/// - ISBNが未登録であること
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreateBookRequest>,
) -> Result<(StatusCode, Json<BookResponse>), ApiError> {
    let cmd = req.validate()?;
    let book = catalog::create_book(&state.catalog, cmd).await?;

    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

/// GET /api/books/:id - 書籍をIDで取得
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    PathParam(book_id): PathParam<Uuid>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = catalog::get_book(&state.catalog, BookId::from_uuid(book_id))
        .await?
        .ok_or(ApiError::NotFound("Book"))?;

    Ok(Json(BookResponse::from(book)))
}

/// PUT /api/books/:id - タイトルと著者を更新（ISBNは変更不可）
pub async fn update_book(
    State(state): State<Arc<AppState>>,
    PathParam(book_id): PathParam<Uuid>,
    JsonBody(req): JsonBody<UpdateBookRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    let cmd = req.validate(BookId::from_uuid(book_id))?;
    let book = catalog::update_book(&state.catalog, cmd).await?;

    Ok(Json(BookResponse::from(book)))
}

/// DELETE /api/books/:id - 書籍を削除
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    PathParam(book_id): PathParam<Uuid>,
) -> Result<StatusCode, ApiError> {
    catalog::delete_book(&state.catalog, BookId::from_uuid(book_id)).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/books - 部分一致で書籍を検索
///
/// クエリパラメータ:
/// - title, author, isbn: 指定したものだけで絞り込む（部分一致）
/// - page, size: ページ番号（0始まり）とページサイズ
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<ListBooksQuery>,
) -> Result<Json<PageResponse<BookResponse>>, ApiError> {
    let page = catalog::find_books(&state.catalog, query.filter(), query.page_request()).await?;

    Ok(Json(PageResponse::from_page(page)))
}

// ============================================================================
// Loan handlers
// ============================================================================

/// POST /api/loans - 書籍を貸し出す
///
/// ISBNから書籍を解決してから貸出を作成する。
///
/// 強制されるビジネスルール:
/// - 書籍が存在すること
/// - 書籍が貸出中でないこと
pub async fn create_loan(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreateLoanRequest>,
) -> Result<(StatusCode, Json<LoanResponse>), ApiError> {
    let today = chrono::Local::now().date_naive();
    let valid = req.validate(today)?;

    let book = catalog::get_book_by_isbn(&state.catalog, &valid.isbn)
        .await?
        .ok_or(loan::LoanApplicationError::BookNotFound)?;

    let loan = loan::create_loan(&state.loans, valid.into_command(book.book_id)).await?;

    Ok((StatusCode::CREATED, Json(LoanResponse::from(loan))))
}

/// GET /api/loans/:id - 貸出をIDで取得
pub async fn get_loan(
    State(state): State<Arc<AppState>>,
    PathParam(loan_id): PathParam<Uuid>,
) -> Result<Json<LoanResponse>, ApiError> {
    let loan = loan::get_loan(&state.loans, LoanId::from_uuid(loan_id))
        .await?
        .ok_or(ApiError::NotFound("Loan"))?;

    Ok(Json(LoanResponse::from(loan)))
}

/// POST /api/loans/:id/return - 書籍を返却
///
/// 強制されるビジネスルール:
/// - 貸出が存在すること
/// - 既に返却済みでないこと（二重返却はエラー）
pub async fn return_loan(
    State(state): State<Arc<AppState>>,
    PathParam(loan_id): PathParam<Uuid>,
) -> Result<Json<LoanResponse>, ApiError> {
    let cmd = ReturnLoan {
        loan_id: LoanId::from_uuid(loan_id),
    };
    let loan = loan::return_loan(&state.loans, cmd).await?;

    Ok(Json(LoanResponse::from(loan)))
}

/// GET /api/loans - ISBNまたは利用者で貸出を検索
///
/// クエリパラメータ:
/// - isbn: 書籍のISBN（完全一致）
/// - customer: 利用者（完全一致）
/// - page, size: ページ番号（0始まり）とページサイズ
///
/// isbn と customer はOR結合。どちらも指定しない場合は全件。
pub async fn list_loans(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<ListLoansQuery>,
) -> Result<Json<PageResponse<LoanResponse>>, ApiError> {
    let page = loan::find_loans(&state.loans, query.filter(), query.page_request()).await?;

    Ok(Json(PageResponse::from_page(page)))
}
