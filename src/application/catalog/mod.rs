mod catalog_service;
mod errors;

pub use catalog_service::{
    CatalogDependencies, create_book, delete_book, find_books, get_book, get_book_by_isbn,
    update_book,
};
pub use errors::{CatalogApplicationError, Result};
