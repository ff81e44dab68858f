pub mod book;
pub mod commands;
pub mod errors;
pub mod loan;
pub mod page;
pub mod value_objects;

pub use book::{Book, BookFilter, NewBook};
pub use errors::*;
pub use loan::{Loan, NewLoan};
pub use page::{Page, PageRequest};
pub use value_objects::*;
