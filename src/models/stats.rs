//! Dashboard statistics models

use serde::Serialize;
use utoipa::ToSchema;

/// Snapshot aggregated over the whole catalog, registry and ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct DashboardStats {
    /// Sum of `stock_total` over all books
    pub total_stock: u64,
    /// Sum of `stock_available` over all books
    pub available_stock: u64,
    /// `total_stock - available_stock`
    pub borrowed_stock: u64,
    pub borrower_count: u64,
    /// Unreturned loans, overdue ones included
    pub active_loan_count: u64,
    pub overdue_count: u64,
}

/// Circulation figures of a single title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BookCirculation {
    pub code: String,
    pub title: String,
    pub publisher: String,
    pub borrowed: u32,
    pub stock_total: u32,
}
