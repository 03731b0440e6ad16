//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, borrowers, health, loans, stats};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "School Library API",
        version = "1.0.0",
        description = "Catalog, borrower registry and loan desk of a school library"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::list_categories,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Borrowers
        borrowers::list_borrowers,
        borrowers::get_borrower,
        borrowers::create_borrower,
        borrowers::update_borrower,
        borrowers::delete_borrower,
        // Loans
        loans::list_loans,
        loans::list_active_loans,
        loans::get_loan,
        loans::get_borrower_loans,
        loans::create_loan,
        loans::return_loan,
        // Stats
        stats::get_stats,
        stats::get_most_borrowed,
    ),
    components(
        schemas(
            // Books
            crate::models::book::Book,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Borrowers
            crate::models::borrower::Borrower,
            crate::models::borrower::CreateBorrower,
            crate::models::borrower::UpdateBorrower,
            // Loans
            crate::models::loan::Loan,
            crate::models::loan::LoanStatus,
            crate::models::loan::LoanStatusFilter,
            crate::models::loan::LoanDetails,
            crate::models::loan::CreateLoan,
            loans::LoanResponse,
            loans::ReturnResponse,
            // Stats
            crate::models::stats::DashboardStats,
            crate::models::stats::BookCirculation,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Catalog management"),
        (name = "borrowers", description = "Student registry"),
        (name = "loans", description = "Borrowing and returning"),
        (name = "stats", description = "Statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
