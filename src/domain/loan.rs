use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{BookId, LoanId, ReturnLoanError, commands::CreateLoan};

/// 延滞とみなすまでの日数（既定値）
pub const DEFAULT_OVERDUE_DAYS: u32 = 4;

/// Loan集約 - 1冊の書籍の1回の貸出
///
/// 書籍はIDでのみ参照し、所有しない。
/// 状態遷移は `returned: false -> true` の一度きり。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub loan_id: LoanId,
    pub book_id: BookId,
    pub customer: String,
    pub customer_email: Option<String>,
    pub loan_date: NaiveDate,
    pub returned: bool,
}

impl Loan {
    /// 貸出中（未返却）か
    pub fn is_active(&self) -> bool {
        !self.returned
    }

    /// 通知先（メールアドレスがあればそれ、なければ利用者名）
    pub fn contact(&self) -> &str {
        self.customer_email.as_deref().unwrap_or(&self.customer)
    }
}

/// 未保存の貸出（IDはストアが採番する）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoan {
    pub book_id: BookId,
    pub customer: String,
    pub customer_email: Option<String>,
    pub loan_date: NaiveDate,
}

/// 純粋関数：書籍を貸し出す
///
/// 新しい貸出は常に未返却で始まる。
/// 「1冊につき貸出中は1件まで」はアプリケーション層とストアで保証する。
pub fn open_loan(cmd: CreateLoan) -> NewLoan {
    NewLoan {
        book_id: cmd.book_id,
        customer: cmd.customer,
        customer_email: cmd.customer_email,
        loan_date: cmd.loan_date,
    }
}

/// 純粋関数：書籍を返却する
///
/// 二重返却は冪等に扱わずエラーとする。
pub fn return_loan(loan: &Loan) -> Result<Loan, ReturnLoanError> {
    if loan.returned {
        return Err(ReturnLoanError::AlreadyReturned);
    }

    Ok(Loan {
        returned: true,
        ..loan.clone()
    })
}

/// 純粋関数：延滞判定の基準日（today - days）
pub fn overdue_threshold(today: NaiveDate, days: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}

/// 純粋関数：延滞判定
///
/// 基準日と同日の貸出は延滞ではない（厳密な不等号）。
pub fn is_overdue(loan: &Loan, threshold: NaiveDate) -> bool {
    loan.is_active() && loan.loan_date < threshold
}
