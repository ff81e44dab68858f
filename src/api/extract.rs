//! リクエスト抽出器
//!
//! axum標準の抽出器と同じだが、拒否時は `ApiError` として
//! `{"code","errors"}` 形式の400を返す。

use axum::extract::{FromRequest, FromRequestParts};

use super::error::ApiError;

/// JSONボディ
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// パスパラメータ
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParam<T>(pub T);

/// クエリパラメータ
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);
