//! In-process record store

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::RecordStore;
use crate::{
    error::{AppError, AppResult},
    models::{Book, Borrower, Loan, NewLoan},
};

#[derive(Default)]
struct Tables {
    books: BTreeMap<String, Book>,
    borrowers: BTreeMap<String, Borrower>,
    /// Ledger in id order; ids are never reused
    loans: Vec<Loan>,
    last_loan_id: i64,
}

/// Record store kept entirely in memory.
///
/// Each operation holds the write lock for its whole check-and-mutate, so
/// `take_copy` cannot be passed by two callers for the last copy.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn select_books(&self) -> AppResult<Vec<Book>> {
        Ok(self.tables.read().await.books.values().cloned().collect())
    }

    async fn select_book(&self, code: &str) -> AppResult<Option<Book>> {
        Ok(self.tables.read().await.books.get(code).cloned())
    }

    async fn insert_book(&self, book: &Book) -> AppResult<Book> {
        let mut tables = self.tables.write().await;
        if tables.books.contains_key(&book.code) {
            return Err(AppError::Duplicate(format!("Book {} already exists", book.code)));
        }
        tables.books.insert(book.code.clone(), book.clone());
        Ok(book.clone())
    }

    async fn update_book_details(&self, book: &Book) -> AppResult<Book> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .books
            .get_mut(&book.code)
            .ok_or_else(|| AppError::BookNotFound(book.code.clone()))?;
        *stored = Book {
            stock_total: stored.stock_total,
            stock_available: stored.stock_available,
            ..book.clone()
        };
        Ok(stored.clone())
    }

    async fn update_book_stock(
        &self,
        current: &Book,
        stock_total: u32,
        stock_available: u32,
    ) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.books.get_mut(&current.code) {
            Some(stored)
                if stored.stock_total == current.stock_total
                    && stored.stock_available == current.stock_available =>
            {
                stored.stock_total = stock_total;
                stored.stock_available = stock_available;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_book(&self, code: &str) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let on_loan = tables
            .loans
            .iter()
            .any(|loan| loan.book_code == code && !loan.is_returned());
        Ok(!on_loan && tables.books.remove(code).is_some())
    }

    async fn take_copy(&self, code: &str) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.books.get_mut(code) {
            Some(book) if book.stock_available > 0 => {
                book.stock_available -= 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn restore_copy(&self, code: &str) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.books.get_mut(code) {
            Some(book) => {
                book.stock_available = book.stock_available.saturating_add(1).min(book.stock_total);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn select_borrowers(&self) -> AppResult<Vec<Borrower>> {
        let mut borrowers: Vec<Borrower> =
            self.tables.read().await.borrowers.values().cloned().collect();
        borrowers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(borrowers)
    }

    async fn select_borrower(&self, id: &str) -> AppResult<Option<Borrower>> {
        Ok(self.tables.read().await.borrowers.get(id).cloned())
    }

    async fn insert_borrower(&self, borrower: &Borrower) -> AppResult<Borrower> {
        let mut tables = self.tables.write().await;
        if tables.borrowers.contains_key(&borrower.id) {
            return Err(AppError::Duplicate(format!(
                "Borrower {} already exists",
                borrower.id
            )));
        }
        tables.borrowers.insert(borrower.id.clone(), borrower.clone());
        Ok(borrower.clone())
    }

    async fn update_borrower(&self, borrower: &Borrower) -> AppResult<Borrower> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .borrowers
            .get_mut(&borrower.id)
            .ok_or_else(|| AppError::BorrowerNotFound(borrower.id.clone()))?;
        *stored = borrower.clone();
        Ok(borrower.clone())
    }

    async fn delete_borrower(&self, id: &str) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let holding = tables
            .loans
            .iter()
            .any(|loan| loan.borrower_id == id && !loan.is_returned());
        Ok(!holding && tables.borrowers.remove(id).is_some())
    }

    async fn select_loans(&self) -> AppResult<Vec<Loan>> {
        Ok(self.tables.read().await.loans.clone())
    }

    async fn select_loan(&self, id: i64) -> AppResult<Option<Loan>> {
        Ok(self
            .tables
            .read()
            .await
            .loans
            .iter()
            .find(|loan| loan.id == id)
            .cloned())
    }

    async fn insert_loan(&self, loan: &NewLoan) -> AppResult<Loan> {
        let mut tables = self.tables.write().await;
        tables.last_loan_id += 1;
        let loan = loan.clone().into_loan(tables.last_loan_id);
        tables.loans.push(loan.clone());
        Ok(loan)
    }

    async fn update_loan(&self, loan: &Loan) -> AppResult<Loan> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .loans
            .iter_mut()
            .find(|stored| stored.id == loan.id)
            .ok_or(AppError::LoanNotFound(loan.id))?;
        *stored = loan.clone();
        Ok(loan.clone())
    }

    async fn close_loan(&self, loan: &Loan) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.loans.iter_mut().find(|stored| stored.id == loan.id) {
            Some(stored) if !stored.is_returned() => {
                *stored = loan.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
