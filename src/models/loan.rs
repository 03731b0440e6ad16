//! Loan model, lifecycle states and related types

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{book::Book, borrower::Borrower};
use crate::error::{AppError, AppResult};

/// Loan lifecycle state.
///
/// Only `Active` and `Returned` are ever persisted. `Overdue` is derived from
/// the due date whenever a loan is read (see [`Loan::as_of`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Active,
    Overdue,
    Returned,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "active",
            LoanStatus::Overdue => "overdue",
            LoanStatus::Returned => "returned",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the loan ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Loan {
    pub id: i64,
    pub book_code: String,
    pub borrower_id: String,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub status: LoanStatus,
}

impl Loan {
    pub fn is_returned(&self) -> bool {
        self.status == LoanStatus::Returned
    }

    /// True while the loan is unreturned and `today` is past the due date
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_returned() && today > self.due_date
    }

    /// Status as seen on `today`
    pub fn status_on(&self, today: NaiveDate) -> LoanStatus {
        if self.is_returned() {
            LoanStatus::Returned
        } else if self.is_overdue(today) {
            LoanStatus::Overdue
        } else {
            LoanStatus::Active
        }
    }

    /// Copy of this loan with its status derived for `today`
    pub fn as_of(mut self, today: NaiveDate) -> Self {
        self.status = self.status_on(today);
        self
    }

    /// Close the loan. Fails if it was already returned.
    pub fn mark_returned(&mut self, today: NaiveDate) -> AppResult<()> {
        if self.is_returned() {
            return Err(AppError::AlreadyReturned(self.id));
        }
        self.status = LoanStatus::Returned;
        self.return_date = Some(today);
        Ok(())
    }
}

/// Ledger entry before the store assigns its id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoan {
    pub book_code: String,
    pub borrower_id: String,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
}

impl NewLoan {
    /// Loan starting on `borrow_date`, due `duration_days` later
    pub fn starting(
        borrower_id: &str,
        book_code: &str,
        borrow_date: NaiveDate,
        duration_days: u32,
    ) -> AppResult<Self> {
        let due_date = borrow_date
            .checked_add_days(Days::new(u64::from(duration_days)))
            .ok_or_else(|| AppError::Internal(format!("Due date overflow from {}", borrow_date)))?;

        Ok(Self {
            book_code: book_code.to_string(),
            borrower_id: borrower_id.to_string(),
            borrow_date,
            due_date,
        })
    }

    /// Ledger entry with its assigned id
    pub fn into_loan(self, id: i64) -> Loan {
        Loan {
            id,
            book_code: self.book_code,
            borrower_id: self.borrower_id,
            borrow_date: self.borrow_date,
            due_date: self.due_date,
            return_date: None,
            status: LoanStatus::Active,
        }
    }
}

/// Loan joined with its borrower and book for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanDetails {
    pub loan: Loan,
    /// `None` if the borrower record has since been removed
    pub borrower: Option<Borrower>,
    /// `None` if the book record has since been removed
    pub book: Option<Book>,
    pub is_overdue: bool,
}

/// Borrow request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateLoan {
    #[validate(length(min = 1, message = "Borrower id is required"))]
    pub borrower_id: String,
    #[validate(length(min = 1, message = "Book code is required"))]
    pub book_code: String,
}

/// Ledger listing filter, applied to the derived status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatusFilter {
    #[default]
    All,
    Active,
    Overdue,
    Returned,
}

impl LoanStatusFilter {
    pub fn accepts(&self, status: LoanStatus) -> bool {
        match self {
            LoanStatusFilter::All => true,
            LoanStatusFilter::Active => status == LoanStatus::Active,
            LoanStatusFilter::Overdue => status == LoanStatus::Overdue,
            LoanStatusFilter::Returned => status == LoanStatus::Returned,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct LoanQuery {
    /// `all` (default), `active`, `overdue` or `returned`
    pub status: Option<LoanStatusFilter>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn loan() -> Loan {
        NewLoan::starting("2024001", "NOV-001", date(2026, 1, 20), 14)
            .unwrap()
            .into_loan(1)
    }

    #[test]
    fn test_due_date_is_fourteen_days_later() {
        let loan = loan();
        assert_eq!(loan.due_date, date(2026, 2, 3));
        assert_eq!(loan.status, LoanStatus::Active);
        assert_eq!(loan.return_date, None);
    }

    #[test]
    fn test_overdue_only_after_due_date() {
        let loan = loan();
        assert!(!loan.is_overdue(date(2026, 2, 3)));
        assert!(loan.is_overdue(date(2026, 2, 4)));
        assert_eq!(loan.status_on(date(2026, 2, 3)), LoanStatus::Active);
        assert_eq!(loan.status_on(date(2026, 2, 4)), LoanStatus::Overdue);
    }

    #[test]
    fn test_returned_loan_is_never_overdue() {
        let mut loan = loan();
        loan.mark_returned(date(2026, 3, 1)).unwrap();
        assert!(!loan.is_overdue(date(2027, 1, 1)));
        assert_eq!(loan.status_on(date(2027, 1, 1)), LoanStatus::Returned);
        assert_eq!(loan.return_date, Some(date(2026, 3, 1)));
    }

    #[test]
    fn test_second_return_is_rejected() {
        let mut loan = loan();
        loan.mark_returned(date(2026, 1, 25)).unwrap();
        let err = loan.mark_returned(date(2026, 1, 26)).unwrap_err();
        assert!(matches!(err, AppError::AlreadyReturned(1)));
        assert_eq!(loan.return_date, Some(date(2026, 1, 25)));
    }

    #[test]
    fn test_as_of_relabels_overdue_loans() {
        let loan = loan().as_of(date(2026, 2, 10));
        assert_eq!(loan.status, LoanStatus::Overdue);
    }

    #[test]
    fn test_filter() {
        assert!(LoanStatusFilter::All.accepts(LoanStatus::Returned));
        assert!(LoanStatusFilter::Overdue.accepts(LoanStatus::Overdue));
        assert!(!LoanStatusFilter::Active.accepts(LoanStatus::Overdue));
    }
}
