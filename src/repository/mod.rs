//! Persistence layer: the record store contract and its backends

pub mod memory;
pub mod postgres;
mod rows;
pub mod seed;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{Book, Borrower, Loan, NewLoan},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Record store over the three collections: books, borrowers and loans.
///
/// Every method is a single atomic step on the backing store. The services
/// compose them and undo earlier steps when a later one fails.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Cheap round trip proving the backend answers
    async fn ping(&self) -> AppResult<()>;

    /// All books, ordered by code
    async fn select_books(&self) -> AppResult<Vec<Book>>;

    async fn select_book(&self, code: &str) -> AppResult<Option<Book>>;

    /// Fails with `Duplicate` if the code is taken
    async fn insert_book(&self, book: &Book) -> AppResult<Book>;

    /// Write the descriptive fields of a book, leaving both stock counters
    /// untouched. Returns the stored record with its current counters.
    /// Fails with `BookNotFound` if the code is unknown.
    async fn update_book_details(&self, book: &Book) -> AppResult<Book>;

    /// Set both stock counters, but only if they still hold the values of
    /// `current`. Returns false, changing nothing, if a borrow or return
    /// moved them since `current` was read or the book is gone.
    async fn update_book_stock(
        &self,
        current: &Book,
        stock_total: u32,
        stock_available: u32,
    ) -> AppResult<bool>;

    /// Delete a book unless an unreturned loan still references it.
    /// Returns false if nothing was deleted.
    async fn delete_book(&self, code: &str) -> AppResult<bool>;

    /// Decrement `stock_available` if it is positive.
    /// Returns false, changing nothing, when no copy is on the shelf.
    async fn take_copy(&self, code: &str) -> AppResult<bool>;

    /// Increment `stock_available`, never past `stock_total`.
    /// Returns false if the book does not exist.
    async fn restore_copy(&self, code: &str) -> AppResult<bool>;

    /// All borrowers, ordered by name
    async fn select_borrowers(&self) -> AppResult<Vec<Borrower>>;

    async fn select_borrower(&self, id: &str) -> AppResult<Option<Borrower>>;

    /// Fails with `Duplicate` if the student number is taken
    async fn insert_borrower(&self, borrower: &Borrower) -> AppResult<Borrower>;

    /// Fails with `BorrowerNotFound` if the student number is unknown
    async fn update_borrower(&self, borrower: &Borrower) -> AppResult<Borrower>;

    /// Delete a borrower unless they still hold an unreturned loan.
    /// Returns false if nothing was deleted.
    async fn delete_borrower(&self, id: &str) -> AppResult<bool>;

    /// Whole ledger in id order
    async fn select_loans(&self) -> AppResult<Vec<Loan>>;

    async fn select_loan(&self, id: i64) -> AppResult<Option<Loan>>;

    /// Append to the ledger; the store assigns the next id
    async fn insert_loan(&self, loan: &NewLoan) -> AppResult<Loan>;

    /// Fails with `LoanNotFound` if the id is unknown
    async fn update_loan(&self, loan: &Loan) -> AppResult<Loan>;

    /// Persist a returned loan only if the stored record is still open.
    /// Returns false if it was returned in the meantime or does not exist.
    async fn close_loan(&self, loan: &Loan) -> AppResult<bool>;
}

/// Shared handle injected into every service
pub type Repository = Arc<dyn RecordStore>;
