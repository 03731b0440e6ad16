//! API handlers for the library REST endpoints

pub mod books;
pub mod borrowers;
pub mod health;
pub mod loans;
pub mod openapi;
pub mod stats;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

/// Routes of API v1, relative to `/api/v1`
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Catalog
        .route("/books", get(books::list_books).post(books::create_book))
        .route("/books/categories", get(books::list_categories))
        .route(
            "/books/:code",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        // Borrowers
        .route(
            "/borrowers",
            get(borrowers::list_borrowers).post(borrowers::create_borrower),
        )
        .route(
            "/borrowers/:id",
            get(borrowers::get_borrower)
                .put(borrowers::update_borrower)
                .delete(borrowers::delete_borrower),
        )
        .route("/borrowers/:id/loans", get(loans::get_borrower_loans))
        // Loans
        .route("/loans", get(loans::list_loans).post(loans::create_loan))
        .route("/loans/active", get(loans::list_active_loans))
        .route("/loans/:id", get(loans::get_loan))
        .route("/loans/:id/return", post(loans::return_loan))
        // Statistics
        .route("/stats", get(stats::get_stats))
        .route("/stats/most-borrowed", get(stats::get_most_borrowed))
        .with_state(state)
}
