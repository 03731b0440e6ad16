//! Error types for the school library server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable numeric error codes exposed to API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    DbFailure = 3,
    NoSuchBorrower = 4,
    NoSuchBook = 5,
    BookNotAvailable = 7,
    Duplicate = 8,
    BadValue = 18,
    NoSuchLoan = 20,
    LoanAlreadyReturned = 22,
    RecordInUse = 23,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Book {0} not found")]
    BookNotFound(String),

    #[error("Borrower {0} not found")]
    BorrowerNotFound(String),

    #[error("Loan {0} not found")]
    LoanNotFound(i64),

    #[error("Book {0} is out of stock")]
    OutOfStock(String),

    #[error("Loan {0} has already been returned")]
    AlreadyReturned(i64),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Numeric code reported alongside the message
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::BookNotFound(_) => ErrorCode::NoSuchBook,
            AppError::BorrowerNotFound(_) => ErrorCode::NoSuchBorrower,
            AppError::LoanNotFound(_) => ErrorCode::NoSuchLoan,
            AppError::OutOfStock(_) => ErrorCode::BookNotAvailable,
            AppError::AlreadyReturned(_) => ErrorCode::LoanAlreadyReturned,
            AppError::Persistence(_) => ErrorCode::DbFailure,
            AppError::Validation(_) => ErrorCode::BadValue,
            AppError::Duplicate(_) => ErrorCode::Duplicate,
            AppError::Conflict(_) => ErrorCode::RecordInUse,
            AppError::Internal(_) => ErrorCode::Failure,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Persistence(e.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message) = match &self {
            AppError::BookNotFound(_) | AppError::BorrowerNotFound(_) | AppError::LoanNotFound(_) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            AppError::OutOfStock(_) | AppError::AlreadyReturned(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Duplicate(msg) | AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Persistence(msg) => {
                tracing::error!("Persistence error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_codes() {
        assert_eq!(AppError::OutOfStock("NOV-001".into()).code(), ErrorCode::BookNotAvailable);
        assert_eq!(AppError::AlreadyReturned(3).code(), ErrorCode::LoanAlreadyReturned);
        assert_eq!(
            AppError::Duplicate("Book NOV-001 already exists".into()).code(),
            ErrorCode::Duplicate
        );
        assert_eq!(
            AppError::Conflict("Book NOV-001 has unreturned loans".into()).code(),
            ErrorCode::RecordInUse
        );
    }

    #[test]
    fn test_status_codes() {
        let response = AppError::LoanNotFound(9).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = AppError::OutOfStock("NOV-001".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = AppError::Persistence("connection reset".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
