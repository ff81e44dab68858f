use serde::{Deserialize, Serialize};

use super::{BookId, commands::CreateBook};

/// Book集約 - カタログに登録された1冊の書籍
///
/// 不変条件：ISBNはカタログ全体で一意（ストアの一意制約で保証）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub book_id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: String,
}

/// 未保存の書籍（IDはストアが採番する）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
}

impl From<CreateBook> for NewBook {
    fn from(cmd: CreateBook) -> Self {
        Self {
            title: cmd.title,
            author: cmd.author,
            isbn: cmd.isbn,
        }
    }
}

/// 書籍検索の部分一致テンプレート
///
/// 値が設定されたフィールドのみで絞り込む（大文字小文字を区別しない部分一致、AND結合）。
/// すべて未設定の場合は全件が対象。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookFilter {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
}

impl BookFilter {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.isbn.is_none()
    }

    /// 書籍がテンプレートに一致するか
    pub fn matches(&self, book: &Book) -> bool {
        contains_ignore_case(&book.title, self.title.as_deref())
            && contains_ignore_case(&book.author, self.author.as_deref())
            && contains_ignore_case(&book.isbn, self.isbn.as_deref())
    }
}

fn contains_ignore_case(value: &str, needle: Option<&str>) -> bool {
    match needle {
        Some(needle) => value.to_lowercase().contains(&needle.to_lowercase()),
        None => true,
    }
}

/// 純粋関数：タイトルと著者を更新する
///
/// ISBNは更新で変わらない。
pub fn revise_book(book: &Book, title: String, author: String) -> Book {
    Book {
        title,
        author,
        ..book.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_book() -> Book {
        Book {
            book_id: BookId::new(),
            title: "As aventuras".to_string(),
            author: "Artur".to_string(),
            isbn: "001".to_string(),
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = BookFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches(&sample_book()));
    }

    #[test]
    fn test_filter_is_case_insensitive_substring() {
        let filter = BookFilter {
            title: Some("AVENT".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&sample_book()));
    }

    #[test]
    fn test_filter_fields_are_combined_with_and() {
        let filter = BookFilter {
            title: Some("aventuras".to_string()),
            author: Some("Fulano".to_string()),
            isbn: None,
        };
        assert!(!filter.matches(&sample_book()));
    }

    #[test]
    fn test_revise_book_keeps_isbn_and_id() {
        let book = sample_book();
        let revised = revise_book(&book, "Outro".to_string(), "Autor".to_string());

        assert_eq!(revised.book_id, book.book_id);
        assert_eq!(revised.isbn, "001");
        assert_eq!(revised.title, "Outro");
        assert_eq!(revised.author, "Autor");
    }
}
