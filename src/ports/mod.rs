pub mod book_repository;
pub mod loan_repository;
pub mod notification_gateway;
pub mod store_error;

pub use book_repository::BookRepository;
pub use loan_repository::{LoanFilter, LoanRepository};
pub use notification_gateway::NotificationGateway;
pub use store_error::{Constraint, StoreError};
