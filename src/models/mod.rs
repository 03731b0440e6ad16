//! Data models for the school library

pub mod book;
pub mod borrower;
pub mod loan;
pub mod stats;

// Re-export commonly used types
pub use book::{Book, BookQuery, CreateBook, UpdateBook};
pub use borrower::{Borrower, BorrowerQuery, CreateBorrower, UpdateBorrower};
pub use loan::{CreateLoan, Loan, LoanDetails, LoanQuery, LoanStatus, LoanStatusFilter, NewLoan};
pub use stats::{BookCirculation, DashboardStats};
