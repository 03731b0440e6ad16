//! Statistics service

use crate::{
    error::AppResult,
    models::stats::{BookCirculation, DashboardStats},
    repository::Repository,
};

use super::clock::SharedClock;

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
    clock: SharedClock,
}

impl StatsService {
    pub fn new(repository: Repository, clock: SharedClock) -> Self {
        Self { repository, clock }
    }

    /// Dashboard counters over the current catalog, registry and ledger
    pub async fn dashboard_stats(&self) -> AppResult<DashboardStats> {
        let today = self.clock.today();
        let books = self.repository.select_books().await?;
        let borrowers = self.repository.select_borrowers().await?;
        let loans = self.repository.select_loans().await?;

        let total_stock: u64 = books.iter().map(|b| u64::from(b.stock_total)).sum();
        let available_stock: u64 = books.iter().map(|b| u64::from(b.stock_available)).sum();
        let open = loans.iter().filter(|loan| !loan.is_returned());

        Ok(DashboardStats {
            total_stock,
            available_stock,
            borrowed_stock: total_stock.saturating_sub(available_stock),
            borrower_count: borrowers.len() as u64,
            active_loan_count: open.clone().count() as u64,
            overdue_count: open.filter(|loan| loan.is_overdue(today)).count() as u64,
        })
    }

    /// Titles with the most copies currently out, highest first
    pub async fn most_borrowed(&self, limit: usize) -> AppResult<Vec<BookCirculation>> {
        let mut books = self.repository.select_books().await?;
        // stable sort keeps catalog order among ties
        books.sort_by(|a, b| b.borrowed().cmp(&a.borrowed()));

        Ok(books
            .into_iter()
            .take(limit)
            .map(|book| BookCirculation {
                borrowed: book.borrowed(),
                code: book.code,
                title: book.title,
                publisher: book.publisher,
                stock_total: book.stock_total,
            })
            .collect())
    }
}
