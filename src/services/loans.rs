//! Loan ledger and the borrow/return coordination with book stock

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::{Loan, LoanDetails, LoanStatusFilter, NewLoan},
        Book, Borrower,
    },
    repository::Repository,
};

use super::clock::SharedClock;

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    clock: SharedClock,
    duration_days: u32,
}

impl LoansService {
    pub fn new(repository: Repository, clock: SharedClock, duration_days: u32) -> Self {
        Self {
            repository,
            clock,
            duration_days,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Whether `loan` is overdue right now
    pub fn is_overdue(&self, loan: &Loan) -> bool {
        loan.is_overdue(self.today())
    }

    /// Lend one copy of `book_code` to `borrower_id`.
    ///
    /// The copy is taken off the shelf first with a conditional decrement; if
    /// the ledger entry cannot be written afterwards the copy is put back.
    pub async fn borrow(&self, borrower_id: &str, book_code: &str) -> AppResult<Loan> {
        let borrower_id = borrower_id.trim();
        let book_code = book_code.trim();

        if self.repository.select_borrower(borrower_id).await?.is_none() {
            return Err(AppError::BorrowerNotFound(borrower_id.to_string()));
        }
        if self.repository.select_book(book_code).await?.is_none() {
            return Err(AppError::BookNotFound(book_code.to_string()));
        }

        let new_loan = NewLoan::starting(borrower_id, book_code, self.today(), self.duration_days)?;

        if !self.repository.take_copy(book_code).await? {
            return Err(AppError::OutOfStock(book_code.to_string()));
        }

        match self.repository.insert_loan(&new_loan).await {
            Ok(loan) => {
                tracing::info!(
                    "Loan {} created: book {} to borrower {}, due {}",
                    loan.id,
                    loan.book_code,
                    loan.borrower_id,
                    loan.due_date
                );
                Ok(loan)
            }
            Err(e) => {
                tracing::warn!(
                    "Recording loan of {} for {} failed, putting the copy back: {}",
                    book_code,
                    borrower_id,
                    e
                );
                if let Err(undo) = self.repository.restore_copy(book_code).await {
                    tracing::error!("Could not restore stock of book {}: {}", book_code, undo);
                }
                Err(e)
            }
        }
    }

    /// Close a loan and put its copy back on the shelf.
    ///
    /// If the stock cannot be restored the loan record is reopened.
    pub async fn return_loan(&self, loan_id: i64) -> AppResult<Loan> {
        let loan = self
            .repository
            .select_loan(loan_id)
            .await?
            .ok_or(AppError::LoanNotFound(loan_id))?;

        let mut returned = loan.clone();
        returned.mark_returned(self.today())?;

        if !self.repository.close_loan(&returned).await? {
            // Someone else closed it between our read and write
            return Err(AppError::AlreadyReturned(loan_id));
        }

        match self.repository.restore_copy(&returned.book_code).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!(
                "Book {} of loan {} no longer exists, no stock restored",
                returned.book_code,
                loan_id
            ),
            Err(e) => {
                tracing::warn!("Restoring stock for loan {} failed, reopening it: {}", loan_id, e);
                if let Err(undo) = self.repository.update_loan(&loan).await {
                    tracing::error!("Could not reopen loan {}: {}", loan_id, undo);
                }
                return Err(e);
            }
        }

        tracing::info!(
            "Loan {} returned: book {} from borrower {}",
            loan_id,
            returned.book_code,
            returned.borrower_id
        );
        Ok(returned)
    }

    /// Loan by id, status derived for today
    pub async fn get_loan(&self, loan_id: i64) -> AppResult<Option<Loan>> {
        let today = self.today();
        Ok(self
            .repository
            .select_loan(loan_id)
            .await?
            .map(|loan| loan.as_of(today)))
    }

    /// Loan joined with its borrower and book; `None` for an unknown id
    pub async fn loan_details(&self, loan_id: i64) -> AppResult<Option<LoanDetails>> {
        let Some(loan) = self.get_loan(loan_id).await? else {
            return Ok(None);
        };

        let borrower = self.repository.select_borrower(&loan.borrower_id).await?;
        let book = self.repository.select_book(&loan.book_code).await?;

        Ok(Some(self.details(loan, borrower, book)))
    }

    /// Whole ledger in id order, optionally filtered on the derived status
    pub async fn list_loans(&self, filter: LoanStatusFilter) -> AppResult<Vec<Loan>> {
        let today = self.today();
        Ok(self
            .repository
            .select_loans()
            .await?
            .into_iter()
            .map(|loan| loan.as_of(today))
            .filter(|loan| filter.accepts(loan.status))
            .collect())
    }

    /// Unreturned loans, overdue ones included
    pub async fn list_active_loans(&self) -> AppResult<Vec<Loan>> {
        let today = self.today();
        Ok(self
            .repository
            .select_loans()
            .await?
            .into_iter()
            .filter(|loan| !loan.is_returned())
            .map(|loan| loan.as_of(today))
            .collect())
    }

    /// Unreturned loans with borrower and book, for the return desk
    pub async fn active_loan_details(&self) -> AppResult<Vec<LoanDetails>> {
        let loans = self.list_active_loans().await?;
        let books = self.books_by_code().await?;
        let borrowers: HashMap<String, _> = self
            .repository
            .select_borrowers()
            .await?
            .into_iter()
            .map(|borrower| (borrower.id.clone(), borrower))
            .collect();

        Ok(loans
            .into_iter()
            .map(|loan| {
                let borrower = borrowers.get(&loan.borrower_id).cloned();
                let book = books.get(&loan.book_code).cloned();
                self.details(loan, borrower, book)
            })
            .collect())
    }

    /// Unreturned loans of one borrower, joined with their books
    pub async fn active_loans_for_borrower(&self, borrower_id: &str) -> AppResult<Vec<LoanDetails>> {
        let borrower = self
            .repository
            .select_borrower(borrower_id)
            .await?
            .ok_or_else(|| AppError::BorrowerNotFound(borrower_id.to_string()))?;

        let books = self.books_by_code().await?;

        Ok(self
            .list_active_loans()
            .await?
            .into_iter()
            .filter(|loan| loan.borrower_id == borrower.id)
            .map(|loan| {
                let book = books.get(&loan.book_code).cloned();
                self.details(loan, Some(borrower.clone()), book)
            })
            .collect())
    }

    async fn books_by_code(&self) -> AppResult<HashMap<String, Book>> {
        Ok(self
            .repository
            .select_books()
            .await?
            .into_iter()
            .map(|book| (book.code.clone(), book))
            .collect())
    }

    fn details(
        &self,
        loan: Loan,
        borrower: Option<Borrower>,
        book: Option<Book>,
    ) -> LoanDetails {
        LoanDetails {
            is_overdue: self.is_overdue(&loan),
            loan,
            borrower,
            book,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::{
        models::LoanStatus,
        repository::{MemoryStore, MockRecordStore, RecordStore},
        services::clock::FixedClock,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn book(code: &str, total: u32, available: u32) -> Book {
        Book {
            code: code.to_string(),
            title: "Laskar Pelangi".to_string(),
            author: "Andrea Hirata".to_string(),
            publisher: "Bentang Pustaka".to_string(),
            year: Some(2005),
            category: Some("Novel".to_string()),
            isbn: None,
            stock_total: total,
            stock_available: available,
        }
    }

    fn borrower(id: &str) -> Borrower {
        Borrower {
            id: id.to_string(),
            name: "Ahmad Rizki Pratama".to_string(),
            class_name: "7A".to_string(),
        }
    }

    async fn setup(available: u32, today: NaiveDate) -> (Arc<MemoryStore>, LoansService) {
        let store = Arc::new(MemoryStore::new());
        store.insert_book(&book("NOV-001", 5, available)).await.unwrap();
        store.insert_borrower(&borrower("1")).await.unwrap();
        let service = LoansService::new(store.clone(), Arc::new(FixedClock(today)), 14);
        (store, service)
    }

    async fn available(store: &MemoryStore, code: &str) -> u32 {
        store.select_book(code).await.unwrap().unwrap().stock_available
    }

    #[tokio::test]
    async fn test_borrow_takes_one_copy() {
        let (store, service) = setup(5, date(2026, 1, 20)).await;

        let loan = assert_ok!(service.borrow("1", "NOV-001").await);

        assert_eq!(loan.status, LoanStatus::Active);
        assert_eq!(loan.book_code, "NOV-001");
        assert_eq!(loan.borrower_id, "1");
        assert_eq!(loan.borrow_date, date(2026, 1, 20));
        assert_eq!(loan.due_date, date(2026, 2, 3));
        assert_eq!(loan.return_date, None);
        assert_eq!(available(&store, "NOV-001").await, 4);
    }

    #[tokio::test]
    async fn test_borrow_out_of_stock() {
        let (store, service) = setup(0, date(2026, 1, 20)).await;

        let err = assert_err!(service.borrow("1", "NOV-001").await);

        assert!(matches!(err, AppError::OutOfStock(code) if code == "NOV-001"));
        assert_eq!(available(&store, "NOV-001").await, 0);
        assert!(store.select_loans().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_borrow_unknown_borrower_or_book() {
        let (store, service) = setup(5, date(2026, 1, 20)).await;

        let err = assert_err!(service.borrow("99", "NOV-001").await);
        assert!(matches!(err, AppError::BorrowerNotFound(_)));

        let err = assert_err!(service.borrow("1", "NOV-404").await);
        assert!(matches!(err, AppError::BookNotFound(_)));

        assert_eq!(available(&store, "NOV-001").await, 5);
        assert!(store.select_loans().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_several_copies_can_be_out_at_once() {
        let (store, service) = setup(2, date(2026, 1, 20)).await;

        assert_ok!(service.borrow("1", "NOV-001").await);
        assert_ok!(service.borrow("1", "NOV-001").await);
        let err = assert_err!(service.borrow("1", "NOV-001").await);

        assert!(matches!(err, AppError::OutOfStock(_)));
        assert_eq!(store.select_loans().await.unwrap().len(), 2);
        assert_eq!(available(&store, "NOV-001").await, 0);
    }

    #[tokio::test]
    async fn test_return_restores_copy() {
        let (store, service) = setup(5, date(2026, 1, 20)).await;
        let loan = service.borrow("1", "NOV-001").await.unwrap();
        assert_eq!(available(&store, "NOV-001").await, 4);

        let returned = assert_ok!(service.return_loan(loan.id).await);

        assert_eq!(returned.status, LoanStatus::Returned);
        assert_eq!(returned.return_date, Some(date(2026, 1, 20)));
        assert_eq!(available(&store, "NOV-001").await, 5);
    }

    #[tokio::test]
    async fn test_double_return_is_rejected() {
        let (store, service) = setup(5, date(2026, 1, 20)).await;
        let loan = service.borrow("1", "NOV-001").await.unwrap();
        service.return_loan(loan.id).await.unwrap();

        let err = assert_err!(service.return_loan(loan.id).await);

        assert!(matches!(err, AppError::AlreadyReturned(id) if id == loan.id));
        assert_eq!(available(&store, "NOV-001").await, 5);
    }

    #[tokio::test]
    async fn test_return_unknown_loan() {
        let (_store, service) = setup(5, date(2026, 1, 20)).await;
        let err = assert_err!(service.return_loan(7).await);
        assert!(matches!(err, AppError::LoanNotFound(7)));
    }

    #[tokio::test]
    async fn test_return_is_clamped_when_stock_drifted() {
        let (store, service) = setup(5, date(2026, 1, 20)).await;
        let loan = service.borrow("1", "NOV-001").await.unwrap();
        // a manual correction put the copy back by hand
        let drifted = store.select_book("NOV-001").await.unwrap().unwrap();
        assert!(store.update_book_stock(&drifted, 5, 5).await.unwrap());

        assert_ok!(service.return_loan(loan.id).await);
        assert_eq!(available(&store, "NOV-001").await, 5);
    }

    #[tokio::test]
    async fn test_overdue_is_derived_on_read() {
        let store = Arc::new(MemoryStore::new());
        store.insert_book(&book("NOV-001", 5, 5)).await.unwrap();
        store.insert_borrower(&borrower("1")).await.unwrap();

        let lender = LoansService::new(store.clone(), Arc::new(FixedClock(date(2026, 1, 1))), 14);
        let loan = lender.borrow("1", "NOV-001").await.unwrap();

        let later = LoansService::new(store.clone(), Arc::new(FixedClock(date(2026, 1, 20))), 14);
        let seen = later.get_loan(loan.id).await.unwrap().unwrap();
        assert_eq!(seen.status, LoanStatus::Overdue);
        assert!(later.is_overdue(&seen));

        let overdue = later.list_loans(LoanStatusFilter::Overdue).await.unwrap();
        assert_eq!(overdue.len(), 1);
        assert!(later.list_loans(LoanStatusFilter::Active).await.unwrap().is_empty());
        assert_eq!(later.list_active_loans().await.unwrap().len(), 1);

        let returned = later.return_loan(loan.id).await.unwrap();
        assert!(!later.is_overdue(&returned));
        let seen = later.get_loan(loan.id).await.unwrap().unwrap();
        assert_eq!(seen.status, LoanStatus::Returned);
        assert!(later.list_active_loans().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_loan_details() {
        let (_store, service) = setup(5, date(2026, 1, 20)).await;
        let loan = service.borrow("1", "NOV-001").await.unwrap();

        let details = service.loan_details(loan.id).await.unwrap().unwrap();
        assert_eq!(details.loan.id, loan.id);
        assert_eq!(details.borrower.unwrap().name, "Ahmad Rizki Pratama");
        assert_eq!(details.book.unwrap().title, "Laskar Pelangi");
        assert!(!details.is_overdue);

        assert!(service.loan_details(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_active_loans_for_borrower() {
        let (store, service) = setup(5, date(2026, 1, 20)).await;
        store.insert_borrower(&borrower("2")).await.unwrap();

        let first = service.borrow("1", "NOV-001").await.unwrap();
        service.borrow("1", "NOV-001").await.unwrap();
        service.borrow("2", "NOV-001").await.unwrap();
        service.return_loan(first.id).await.unwrap();

        let loans = service.active_loans_for_borrower("1").await.unwrap();
        assert_eq!(loans.len(), 1);
        assert_eq!(loans[0].book.as_ref().unwrap().code, "NOV-001");
        assert!(loans.iter().all(|d| d.loan.borrower_id == "1"));

        let err = assert_err!(service.active_loans_for_borrower("99").await);
        assert!(matches!(err, AppError::BorrowerNotFound(_)));

        assert_eq!(service.active_loan_details().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_stock_plus_open_loans_equals_total() {
        let (store, service) = setup(5, date(2026, 1, 20)).await;

        let mut open = Vec::new();
        for _ in 0..4 {
            open.push(service.borrow("1", "NOV-001").await.unwrap().id);
        }
        service.return_loan(open[1]).await.unwrap();
        service.return_loan(open[3]).await.unwrap();
        let _ = service.return_loan(open[3]).await;
        let _ = service.borrow("1", "NOV-404").await;

        let book = store.select_book("NOV-001").await.unwrap().unwrap();
        let active = service.list_active_loans().await.unwrap().len() as u32;
        assert_eq!(book.stock_available + active, book.stock_total);
        for loan in store.select_loans().await.unwrap() {
            assert_eq!(loan.status == LoanStatus::Returned, loan.return_date.is_some());
        }
    }

    #[tokio::test]
    async fn test_borrow_then_return_round_trip() {
        let (store, service) = setup(3, date(2026, 1, 20)).await;
        let loan = service.borrow("1", "NOV-001").await.unwrap();
        service.return_loan(loan.id).await.unwrap();
        assert_eq!(available(&store, "NOV-001").await, 3);
    }

    fn mock_with_lendable_book() -> MockRecordStore {
        let mut store = MockRecordStore::new();
        store
            .expect_select_borrower()
            .returning(|_| Ok(Some(borrower("1"))));
        store
            .expect_select_book()
            .returning(|_| Ok(Some(book("NOV-001", 5, 5))));
        store
    }

    #[tokio::test]
    async fn test_failed_ledger_write_puts_copy_back() {
        let mut store = mock_with_lendable_book();
        store.expect_take_copy().times(1).returning(|_| Ok(true));
        store
            .expect_insert_loan()
            .times(1)
            .returning(|_| Err(AppError::Persistence("disk full".to_string())));
        store.expect_restore_copy().times(1).returning(|_| Ok(true));

        let service = LoansService::new(Arc::new(store), Arc::new(FixedClock(date(2026, 1, 20))), 14);
        let err = assert_err!(service.borrow("1", "NOV-001").await);
        assert!(matches!(err, AppError::Persistence(_)));
    }

    #[tokio::test]
    async fn test_out_of_stock_never_writes_ledger() {
        let mut store = mock_with_lendable_book();
        store.expect_take_copy().times(1).returning(|_| Ok(false));
        store.expect_insert_loan().never();
        store.expect_restore_copy().never();

        let service = LoansService::new(Arc::new(store), Arc::new(FixedClock(date(2026, 1, 20))), 14);
        let err = assert_err!(service.borrow("1", "NOV-001").await);
        assert!(matches!(err, AppError::OutOfStock(_)));
    }

    #[tokio::test]
    async fn test_failed_stock_restore_reopens_loan() {
        let open = NewLoan::starting("1", "NOV-001", date(2026, 1, 10), 14)
            .unwrap()
            .into_loan(5);

        let mut store = MockRecordStore::new();
        store
            .expect_select_loan()
            .returning(move |_| Ok(Some(open.clone())));
        store.expect_close_loan().times(1).returning(|_| Ok(true));
        store
            .expect_restore_copy()
            .times(1)
            .returning(|_| Err(AppError::Persistence("connection reset".to_string())));
        store
            .expect_update_loan()
            .times(1)
            .withf(|loan: &Loan| loan.status == LoanStatus::Active && loan.return_date.is_none())
            .returning(|loan| Ok(loan.clone()));

        let service = LoansService::new(Arc::new(store), Arc::new(FixedClock(date(2026, 1, 20))), 14);
        let err = assert_err!(service.return_loan(5).await);
        assert!(matches!(err, AppError::Persistence(_)));
    }

    #[tokio::test]
    async fn test_lost_return_race_reports_already_returned() {
        let open = NewLoan::starting("1", "NOV-001", date(2026, 1, 10), 14)
            .unwrap()
            .into_loan(5);

        let mut store = MockRecordStore::new();
        store
            .expect_select_loan()
            .returning(move |_| Ok(Some(open.clone())));
        store.expect_close_loan().times(1).returning(|_| Ok(false));
        store.expect_restore_copy().never();

        let service = LoansService::new(Arc::new(store), Arc::new(FixedClock(date(2026, 1, 20))), 14);
        let err = assert_err!(service.return_loan(5).await);
        assert!(matches!(err, AppError::AlreadyReturned(5)));
    }
}
