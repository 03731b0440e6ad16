//! Loan management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::loan::{CreateLoan, Loan, LoanDetails, LoanQuery},
};

/// Borrow response
#[derive(Serialize, ToSchema)]
pub struct LoanResponse {
    /// Created ledger entry
    pub loan: Loan,
    /// Status message
    pub message: String,
}

/// Return response with the closed loan
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    /// Return status
    pub status: String,
    pub loan: Loan,
}

/// List the ledger, optionally filtered on status
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    params(LoanQuery),
    responses(
        (status = 200, description = "Loans in id order", body = Vec<Loan>)
    )
)]
pub async fn list_loans(
    State(state): State<crate::AppState>,
    Query(query): Query<LoanQuery>,
) -> AppResult<Json<Vec<Loan>>> {
    let loans = state
        .services
        .loans
        .list_loans(query.status.unwrap_or_default())
        .await?;
    Ok(Json(loans))
}

/// Unreturned loans with borrower and book
#[utoipa::path(
    get,
    path = "/loans/active",
    tag = "loans",
    responses(
        (status = 200, description = "Active and overdue loans", body = Vec<LoanDetails>)
    )
)]
pub async fn list_active_loans(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    Ok(Json(state.services.loans.active_loan_details().await?))
}

/// Get a loan with its borrower and book
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    params(
        ("id" = i64, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan details", body = LoanDetails),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan(
    State(state): State<crate::AppState>,
    Path(loan_id): Path<i64>,
) -> AppResult<Json<LoanDetails>> {
    state
        .services
        .loans
        .loan_details(loan_id)
        .await?
        .map(Json)
        .ok_or(AppError::LoanNotFound(loan_id))
}

/// Books currently held by a borrower
#[utoipa::path(
    get,
    path = "/borrowers/{id}/loans",
    tag = "loans",
    params(
        ("id" = String, Path, description = "Student number")
    ),
    responses(
        (status = 200, description = "Borrower's unreturned loans", body = Vec<LoanDetails>),
        (status = 404, description = "Borrower not found")
    )
)]
pub async fn get_borrower_loans(
    State(state): State<crate::AppState>,
    Path(borrower_id): Path<String>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state
        .services
        .loans
        .active_loans_for_borrower(&borrower_id)
        .await?;
    Ok(Json(loans))
}

/// Lend one copy of a book to a borrower
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    request_body = CreateLoan,
    responses(
        (status = 201, description = "Loan created", body = LoanResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Borrower or book not found"),
        (status = 422, description = "No copy available")
    )
)]
pub async fn create_loan(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateLoan>,
) -> AppResult<(StatusCode, Json<LoanResponse>)> {
    request.validate()?;

    let loan = state
        .services
        .loans
        .borrow(&request.borrower_id, &request.book_code)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(LoanResponse {
            message: format!("Book borrowed, due {}", loan.due_date),
            loan,
        }),
    ))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    params(
        ("id" = i64, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = ReturnResponse),
        (status = 404, description = "Loan not found"),
        (status = 422, description = "Already returned")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    Path(loan_id): Path<i64>,
) -> AppResult<Json<ReturnResponse>> {
    let loan = state.services.loans.return_loan(loan_id).await?;

    Ok(Json(ReturnResponse {
        status: "returned".to_string(),
        loan,
    }))
}
