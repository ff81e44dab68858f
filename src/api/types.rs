use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    Book, BookFilter, BookId, Loan, Page, PageRequest,
    commands::{CreateBook, CreateLoan, UpdateBook},
    page::DEFAULT_PAGE_SIZE,
};
use crate::ports::LoanFilter;

use super::validation::{ValidationErrors, optional_email, required};

// ============================================================================
// Requests
// ============================================================================

/// 書籍登録リクエスト（POST /api/books）
///
/// 必須項目の欠落をバリデーションエラーとして返すため、すべてOptionで受け取る。
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CreateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
}

impl CreateBookRequest {
    pub fn validate(&self) -> Result<CreateBook, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let title = required(&mut errors, "title", self.title.as_deref());
        let author = required(&mut errors, "author", self.author.as_deref());
        let isbn = required(&mut errors, "isbn", self.isbn.as_deref());

        errors.into_result(|| CreateBook {
            title,
            author,
            isbn,
        })
    }
}

/// 書籍更新リクエスト（PUT /api/books/:id）
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
}

impl UpdateBookRequest {
    pub fn validate(&self, book_id: BookId) -> Result<UpdateBook, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let title = required(&mut errors, "title", self.title.as_deref());
        let author = required(&mut errors, "author", self.author.as_deref());

        errors.into_result(|| UpdateBook {
            book_id,
            title,
            author,
        })
    }
}

/// 貸出作成リクエスト（POST /api/loans）
///
/// 書籍はISBNで指定する。貸出日の省略時は当日。
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CreateLoanRequest {
    pub isbn: Option<String>,
    pub customer: Option<String>,
    pub customer_email: Option<String>,
    pub loan_date: Option<NaiveDate>,
}

/// 検証済みの貸出作成リクエスト（書籍IDの解決前）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidLoanRequest {
    pub isbn: String,
    pub customer: String,
    pub customer_email: Option<String>,
    pub loan_date: NaiveDate,
}

impl ValidLoanRequest {
    pub fn into_command(self, book_id: BookId) -> CreateLoan {
        CreateLoan {
            book_id,
            customer: self.customer,
            customer_email: self.customer_email,
            loan_date: self.loan_date,
        }
    }
}

impl CreateLoanRequest {
    pub fn validate(&self, today: NaiveDate) -> Result<ValidLoanRequest, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let isbn = required(&mut errors, "isbn", self.isbn.as_deref());
        let customer = required(&mut errors, "customer", self.customer.as_deref());
        let customer_email =
            optional_email(&mut errors, "customer_email", self.customer_email.as_deref());
        let loan_date = self.loan_date.unwrap_or(today);

        if loan_date > today {
            errors.add("loan_date", "must not be in the future");
        }

        errors.into_result(|| ValidLoanRequest {
            isbn,
            customer,
            customer_email,
            loan_date,
        })
    }
}

/// 書籍一覧のクエリパラメータ（GET /api/books）
#[derive(Debug, Default, Deserialize)]
pub struct ListBooksQuery {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl ListBooksQuery {
    pub fn filter(&self) -> BookFilter {
        BookFilter {
            title: non_blank(self.title.as_deref()),
            author: non_blank(self.author.as_deref()),
            isbn: non_blank(self.isbn.as_deref()),
        }
    }

    pub fn page_request(&self) -> PageRequest {
        page_request(self.page, self.size)
    }
}

/// 貸出一覧のクエリパラメータ（GET /api/loans）
///
/// isbn と customer はOR結合。
#[derive(Debug, Default, Deserialize)]
pub struct ListLoansQuery {
    pub isbn: Option<String>,
    pub customer: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl ListLoansQuery {
    pub fn filter(&self) -> LoanFilter {
        LoanFilter {
            isbn: non_blank(self.isbn.as_deref()),
            customer: non_blank(self.customer.as_deref()),
        }
    }

    pub fn page_request(&self) -> PageRequest {
        page_request(self.page, self.size)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn page_request(page: Option<u32>, size: Option<u32>) -> PageRequest {
    PageRequest::new(page.unwrap_or(0), size.unwrap_or(DEFAULT_PAGE_SIZE))
}

// ============================================================================
// Responses
// ============================================================================

/// 書籍レスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookResponse {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub isbn: String,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.book_id.value(),
            title: book.title,
            author: book.author,
            isbn: book.isbn,
        }
    }
}

/// 貸出レスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanResponse {
    pub id: Uuid,
    pub book_id: Uuid,
    pub customer: String,
    pub customer_email: Option<String>,
    pub loan_date: NaiveDate,
    pub returned: bool,
}

impl From<Loan> for LoanResponse {
    fn from(loan: Loan) -> Self {
        Self {
            id: loan.loan_id.value(),
            book_id: loan.book_id.value(),
            customer: loan.customer,
            customer_email: loan.customer_email,
            loan_date: loan.loan_date,
            returned: loan.returned,
        }
    }
}

/// ページングレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> PageResponse<T> {
    pub fn from_page<U>(page: Page<U>) -> Self
    where
        T: From<U>,
    {
        let total_pages = page.total_pages();
        let page = page.map(T::from);
        Self {
            content: page.content,
            page: page.page,
            size: page.size,
            total_elements: page.total_elements,
            total_pages,
        }
    }
}

/// エラーレスポンス
///
/// バリデーションエラーはフィールドごとに複数、業務エラーは1件のメッセージを持つ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub errors: Vec<String>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            errors: vec![message.into()],
        }
    }

    pub fn with_errors(code: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            code: code.into(),
            errors,
        }
    }
}
