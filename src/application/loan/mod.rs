mod errors;
mod loan_service;
mod overdue_sweep;

pub use errors::{LoanApplicationError, Result};
pub use loan_service::{
    ServiceDependencies, create_loan, find_loans, find_overdue, get_loan, return_loan,
};
pub use overdue_sweep::{
    DEFAULT_INTERVAL, DEFAULT_SUBJECT, SweepReport, SweepSettings, run_overdue_sweep,
    spawn_overdue_sweep,
};
