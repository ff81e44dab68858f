use crate::application::{catalog::CatalogApplicationError, loan::LoanApplicationError};
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::{types::ErrorResponse, validation::ValidationErrors};

/// API層のエラー型
///
/// バリデーションエラーとアプリケーション層のエラーをまとめ、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub enum ApiError {
    /// 入力不正（フィールドごとのメッセージ）
    Validation(ValidationErrors),
    Catalog(CatalogApplicationError),
    Loan(LoanApplicationError),
    /// 参照されたリソースが存在しない
    NotFound(&'static str),
    /// ボディ・パス・クエリを解釈できない（ハンドラー到達前）
    MalformedRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::MalformedRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::MalformedRequest(rejection.body_text())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<CatalogApplicationError> for ApiError {
    fn from(err: CatalogApplicationError) -> Self {
        ApiError::Catalog(err)
    }
}

impl From<LoanApplicationError> for ApiError {
    fn from(err: LoanApplicationError) -> Self {
        ApiError::Loan(err)
    }
}

impl ApiError {
    fn status_and_body(self) -> (StatusCode, ErrorResponse) {
        match self {
            // 400 Bad Request - 入力不正
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::with_errors("VALIDATION_ERROR", errors.messages()),
            ),
            ApiError::MalformedRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("VALIDATION_ERROR", message),
            ),

            // 404 Not Found - リクエストされたリソースが存在しない
            ApiError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("NOT_FOUND", format!("{} not found", what)),
            ),
            ApiError::Catalog(CatalogApplicationError::BookNotFound) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("BOOK_NOT_FOUND", "Book not found"),
            ),
            ApiError::Loan(LoanApplicationError::LoanNotFound) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("LOAN_NOT_FOUND", "Loan not found"),
            ),

            // 422 Unprocessable Entity - ビジネスルール違反
            ApiError::Catalog(CatalogApplicationError::DuplicateIsbn) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse::new("DUPLICATE_ISBN", "ISBN already registered"),
            ),
            ApiError::Loan(LoanApplicationError::BookNotFound) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse::new("BOOK_NOT_FOUND", "Book not found for the given ISBN"),
            ),
            ApiError::Loan(LoanApplicationError::BookAlreadyLoaned) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse::new("BOOK_ALREADY_LOANED", "Book already loaned"),
            ),
            ApiError::Loan(LoanApplicationError::AlreadyReturned) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse::new("LOAN_ALREADY_RETURNED", "Loan already returned"),
            ),

            // 500 Internal Server Error - システム障害
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            ApiError::Catalog(CatalogApplicationError::StoreError(e)) => {
                tracing::error!(error = ?e, "Catalog store error");
                internal_error()
            }
            ApiError::Loan(LoanApplicationError::StoreError(e)) => {
                tracing::error!(error = ?e, "Loan store error");
                internal_error()
            }
        }
    }
}

fn internal_error() -> (StatusCode, ErrorResponse) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorResponse::new("INTERNAL_ERROR", "An unexpected error occurred"),
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::StoreError;

    #[test]
    fn test_validation_errors_map_to_400_with_all_messages() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "must not be empty");
        errors.add("isbn", "must not be empty");

        let (status, body) = ApiError::from(errors).status_and_body();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.errors.len(), 2);
    }

    #[test]
    fn test_duplicate_isbn_maps_to_single_message() {
        let (status, body) =
            ApiError::from(CatalogApplicationError::DuplicateIsbn).status_and_body();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.errors, vec!["ISBN already registered"]);
    }

    #[test]
    fn test_malformed_request_maps_to_400() {
        let (status, body) =
            ApiError::MalformedRequest("Invalid URL".to_string()).status_and_body();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "VALIDATION_ERROR");
        assert_eq!(body.errors, vec!["Invalid URL"]);
    }

    #[test]
    fn test_store_error_hides_details() {
        let err = LoanApplicationError::StoreError(StoreError::backend("connection refused"));
        let (status, body) = ApiError::from(err).status_and_body();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.errors, vec!["An unexpected error occurred"]);
    }
}
