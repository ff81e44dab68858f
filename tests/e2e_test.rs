use axum::body::Body;
use axum::http::{Request, StatusCode};
use rusty_library_api::api::handlers::AppState;
use rusty_library_api::api::router::create_router;
use rusty_library_api::api::types::*;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

mod common;

// ============================================================================
// E2Eテスト用のヘルパー関数
// ============================================================================

/// E2Eテスト用のアプリケーションセットアップ
///
/// インメモリストアと実際のAPIルーターを使用する。
/// テストごとに新しいストアを作るため、テスト間で状態は共有されない。
fn setup_e2e_app() -> axum::Router {
    let ctx = common::memory_context();
    let app_state = Arc::new(AppState {
        catalog: ctx.catalog,
        loans: ctx.loans,
    });

    create_router(app_state)
}

/// リクエストを送り、ステータスとボディ（JSON）を返す
async fn send<T: DeserializeOwned>(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Option<T>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let parsed = if bytes.is_empty() {
        None
    } else {
        Some(serde_json::from_slice(&bytes).unwrap())
    };

    (status, parsed)
}

async fn create_book(app: &axum::Router, isbn: &str) -> BookResponse {
    let (status, body) = send::<BookResponse>(
        app,
        "POST",
        "/api/books",
        Some(json!({ "title": "As aventuras", "author": "Artur", "isbn": isbn })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body.unwrap()
}

async fn create_loan(app: &axum::Router, isbn: &str, customer: &str) -> LoanResponse {
    let (status, body) = send::<LoanResponse>(
        app,
        "POST",
        "/api/loans",
        Some(json!({ "isbn": isbn, "customer": customer })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body.unwrap()
}

// ============================================================================
// E2Eテスト: カタログ
// ============================================================================

#[tokio::test]
async fn test_e2e_health_check() {
    let app = setup_e2e_app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_e2e_book_crud_flow() {
    let app = setup_e2e_app();

    // Step 1: 登録
    let book = create_book(&app, "001").await;
    assert_eq!(book.isbn, "001");

    // Step 2: 取得
    let (status, fetched) = send::<BookResponse>(&app, "GET", &format!("/api/books/{}", book.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched.unwrap(), book);

    // Step 3: 更新（ISBNは変わらない）
    let (status, updated) = send::<BookResponse>(
        &app,
        "PUT",
        &format!("/api/books/{}", book.id),
        Some(json!({ "title": "Outro", "author": "Autor" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let updated = updated.unwrap();
    assert_eq!(updated.title, "Outro");
    assert_eq!(updated.isbn, "001");

    // Step 4: 削除
    let (status, _) = send::<Value>(&app, "DELETE", &format!("/api/books/{}", book.id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // 削除後は404
    let (status, body) = send::<ErrorResponse>(&app, "GET", &format!("/api/books/{}", book.id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.unwrap().code, "NOT_FOUND");

    let (status, body) = send::<ErrorResponse>(&app, "DELETE", &format!("/api/books/{}", book.id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.unwrap().code, "BOOK_NOT_FOUND");
}

#[tokio::test]
async fn test_e2e_create_book_reports_every_invalid_field() {
    let app = setup_e2e_app();

    let (status, body) = send::<ErrorResponse>(
        &app,
        "POST",
        "/api/books",
        Some(json!({ "title": "", "author": "  " })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = body.unwrap();
    assert_eq!(body.code, "VALIDATION_ERROR");
    assert_eq!(body.errors.len(), 3);
}

#[tokio::test]
async fn test_e2e_duplicate_isbn_is_rejected_with_single_message() {
    let app = setup_e2e_app();
    create_book(&app, "001").await;

    let (status, body) = send::<ErrorResponse>(
        &app,
        "POST",
        "/api/books",
        Some(json!({ "title": "Outro", "author": "Autor", "isbn": "001" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let body = body.unwrap();
    assert_eq!(body.code, "DUPLICATE_ISBN");
    assert_eq!(body.errors, vec!["ISBN already registered".to_string()]);
}

#[tokio::test]
async fn test_e2e_list_books_filters_and_paginates() {
    let app = setup_e2e_app();
    for isbn in ["001", "002", "003"] {
        create_book(&app, isbn).await;
    }

    let (status, page) =
        send::<PageResponse<BookResponse>>(&app, "GET", "/api/books?title=AVENT&page=0&size=2", None)
            .await;
    assert_eq!(status, StatusCode::OK);
    let page = page.unwrap();
    assert_eq!(page.content.len(), 2);
    assert_eq!(page.total_elements, 3);
    assert_eq!(page.total_pages, 2);

    let (_, page) =
        send::<PageResponse<BookResponse>>(&app, "GET", "/api/books?isbn=002", None).await;
    let page = page.unwrap();
    assert_eq!(page.total_elements, 1);
    assert_eq!(page.content[0].isbn, "002");
}

// ============================================================================
// E2Eテスト: 貸出
// ============================================================================

#[tokio::test]
async fn test_e2e_full_loan_flow() {
    let app = setup_e2e_app();
    let book = create_book(&app, "123").await;

    // Step 1: 貸出作成（ISBNで書籍を指定）
    let loan = create_loan(&app, "123", "Fulano").await;
    assert_eq!(loan.book_id, book.id);
    assert!(!loan.returned);

    // Step 2: 貸出詳細取得
    let (status, fetched) =
        send::<LoanResponse>(&app, "GET", &format!("/api/loans/{}", loan.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched.unwrap(), loan);

    // Step 3: 同じ書籍は貸し出せない
    let (status, body) = send::<ErrorResponse>(
        &app,
        "POST",
        "/api/loans",
        Some(json!({ "isbn": "123", "customer": "Ciclano" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body.unwrap().code, "BOOK_ALREADY_LOANED");

    // Step 4: 返却
    let (status, returned) = send::<LoanResponse>(
        &app,
        "POST",
        &format!("/api/loans/{}/return", loan.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(returned.unwrap().returned);

    // Step 5: 二重返却はエラー
    let (status, body) = send::<ErrorResponse>(
        &app,
        "POST",
        &format!("/api/loans/{}/return", loan.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body.unwrap().code, "LOAN_ALREADY_RETURNED");

    // Step 6: 返却後は再び貸し出せる
    create_loan(&app, "123", "Ciclano").await;
}

#[tokio::test]
async fn test_e2e_create_loan_for_unknown_isbn() {
    let app = setup_e2e_app();

    let (status, body) = send::<ErrorResponse>(
        &app,
        "POST",
        "/api/loans",
        Some(json!({ "isbn": "999", "customer": "Fulano" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body.unwrap().code, "BOOK_NOT_FOUND");
}

#[tokio::test]
async fn test_e2e_create_loan_validation() {
    let app = setup_e2e_app();

    let (status, body) = send::<ErrorResponse>(
        &app,
        "POST",
        "/api/loans",
        Some(json!({ "customer_email": "not-an-email" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = body.unwrap();
    assert_eq!(body.code, "VALIDATION_ERROR");
    assert_eq!(body.errors.len(), 3);
}

#[tokio::test]
async fn test_e2e_list_loans_by_isbn_or_customer() {
    let app = setup_e2e_app();
    create_book(&app, "123").await;
    create_book(&app, "456").await;
    let loan = create_loan(&app, "123", "Fulano").await;
    create_loan(&app, "456", "Ciclano").await;

    let (status, page) =
        send::<PageResponse<LoanResponse>>(&app, "GET", "/api/loans?isbn=123", None).await;
    assert_eq!(status, StatusCode::OK);
    let page = page.unwrap();
    assert_eq!(page.total_elements, 1);
    assert_eq!(page.content, vec![loan.clone()]);

    let (_, page) =
        send::<PageResponse<LoanResponse>>(&app, "GET", "/api/loans?customer=Fulano", None).await;
    assert_eq!(page.unwrap().content, vec![loan]);

    let (_, page) = send::<PageResponse<LoanResponse>>(
        &app,
        "GET",
        "/api/loans?isbn=123&customer=Ciclano",
        None,
    )
    .await;
    assert_eq!(page.unwrap().total_elements, 2);
}

#[tokio::test]
async fn test_e2e_unknown_loan_returns_404() {
    let app = setup_e2e_app();
    let unknown = Uuid::new_v4();

    let (status, body) =
        send::<ErrorResponse>(&app, "GET", &format!("/api/loans/{}", unknown), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.unwrap().code, "NOT_FOUND");

    let (status, body) = send::<ErrorResponse>(
        &app,
        "POST",
        &format!("/api/loans/{}/return", unknown),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.unwrap().code, "LOAN_NOT_FOUND");
}

// ============================================================================
// E2Eテスト: 解釈できないリクエスト
// ============================================================================

/// 生のボディを送り、エラーレスポンスとして解釈する
async fn send_raw_json(app: &axum::Router, uri: &str, body: &str) -> (StatusCode, ErrorResponse) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_e2e_malformed_json_body_is_a_structured_400() {
    let app = setup_e2e_app();

    let (status, body) = send_raw_json(&app, "/api/books", "not json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.code, "VALIDATION_ERROR");
    assert_eq!(body.errors.len(), 1);
}

#[tokio::test]
async fn test_e2e_wrong_field_type_is_a_structured_400() {
    let app = setup_e2e_app();

    let (status, body) = send_raw_json(
        &app,
        "/api/books",
        r#"{"title": 5, "author": "Artur", "isbn": "001"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.code, "VALIDATION_ERROR");

    let (status, body) = send_raw_json(
        &app,
        "/api/loans",
        r#"{"isbn": "001", "customer": "Fulano", "loan_date": "yesterday"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.code, "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_e2e_invalid_uuid_in_path_is_a_structured_400() {
    let app = setup_e2e_app();

    for (method, uri) in [
        ("GET", "/api/books/not-a-uuid"),
        ("DELETE", "/api/books/not-a-uuid"),
        ("GET", "/api/loans/not-a-uuid"),
        ("POST", "/api/loans/not-a-uuid/return"),
    ] {
        let (status, body) = send::<ErrorResponse>(&app, method, uri, None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri}");
        assert_eq!(body.unwrap().code, "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn test_e2e_invalid_query_is_a_structured_400() {
    let app = setup_e2e_app();

    let (status, body) = send::<ErrorResponse>(&app, "GET", "/api/books?page=-1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.unwrap().code, "VALIDATION_ERROR");

    let (status, body) = send::<ErrorResponse>(&app, "GET", "/api/loans?size=many", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.unwrap().code, "VALIDATION_ERROR");
}
