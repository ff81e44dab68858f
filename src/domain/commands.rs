use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{BookId, LoanId};

/// コマンド：書籍を登録する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
}

/// コマンド：書籍のタイトルと著者を更新する（ISBNは不変）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBook {
    pub book_id: BookId,
    pub title: String,
    pub author: String,
}

/// コマンド：書籍を貸し出す
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateLoan {
    pub book_id: BookId,
    pub customer: String,
    pub customer_email: Option<String>,
    pub loan_date: NaiveDate,
}

/// コマンド：書籍を返却する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnLoan {
    pub loan_id: LoanId,
}
