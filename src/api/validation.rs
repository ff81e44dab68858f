//! 入力の手書きバリデーション
//!
//! サービス層に渡す前に、必須項目と形式をフィールドごとに検査する。

use lettre::Address;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// 1フィールド分のバリデーションエラー
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// バリデーションエラーの一覧
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }

    /// エラーがなければ値を返す
    pub fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

/// 必須の文字列を検査し、前後の空白を除いた値を返す
pub fn required(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<&str>,
) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => {
            errors.add(field, "must not be empty");
            String::new()
        }
    }
}

/// 任意のメールアドレスを検査する
///
/// SMTPゲートウェイと同じくlettreで解釈できるアドレスのみ受け付ける。
pub fn optional_email(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<&str>,
) -> Option<String> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;

    if Address::from_str(value).is_err() {
        errors.add(field, "must be a valid email address");
    }
    Some(value.to_string())
}
