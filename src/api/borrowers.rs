//! Borrower registry endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::borrower::{Borrower, BorrowerQuery, CreateBorrower, UpdateBorrower},
};

/// List or search borrowers
#[utoipa::path(
    get,
    path = "/borrowers",
    tag = "borrowers",
    params(BorrowerQuery),
    responses(
        (status = 200, description = "Matching borrowers", body = Vec<Borrower>)
    )
)]
pub async fn list_borrowers(
    State(state): State<crate::AppState>,
    Query(query): Query<BorrowerQuery>,
) -> AppResult<Json<Vec<Borrower>>> {
    let borrowers = state.services.borrowers.search_borrowers(&query).await?;
    Ok(Json(borrowers))
}

/// Get a borrower by student number
#[utoipa::path(
    get,
    path = "/borrowers/{id}",
    tag = "borrowers",
    params(
        ("id" = String, Path, description = "Student number")
    ),
    responses(
        (status = 200, description = "Borrower details", body = Borrower),
        (status = 404, description = "Borrower not found")
    )
)]
pub async fn get_borrower(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Borrower>> {
    state
        .services
        .borrowers
        .get_borrower(&id)
        .await?
        .map(Json)
        .ok_or(AppError::BorrowerNotFound(id))
}

/// Register a borrower
#[utoipa::path(
    post,
    path = "/borrowers",
    tag = "borrowers",
    request_body = CreateBorrower,
    responses(
        (status = 201, description = "Borrower registered", body = Borrower),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Student number already registered")
    )
)]
pub async fn create_borrower(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateBorrower>,
) -> AppResult<(StatusCode, Json<Borrower>)> {
    request.validate()?;

    let created = state.services.borrowers.register_borrower(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a borrower
#[utoipa::path(
    put,
    path = "/borrowers/{id}",
    tag = "borrowers",
    params(
        ("id" = String, Path, description = "Student number")
    ),
    request_body = UpdateBorrower,
    responses(
        (status = 200, description = "Borrower updated", body = Borrower),
        (status = 404, description = "Borrower not found")
    )
)]
pub async fn update_borrower(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateBorrower>,
) -> AppResult<Json<Borrower>> {
    request.validate()?;

    let borrower = state.services.borrowers.update_borrower(&id, request).await?;
    Ok(Json(borrower))
}

/// Delete a borrower
#[utoipa::path(
    delete,
    path = "/borrowers/{id}",
    tag = "borrowers",
    params(
        ("id" = String, Path, description = "Student number")
    ),
    responses(
        (status = 204, description = "Borrower deleted"),
        (status = 404, description = "Borrower not found"),
        (status = 409, description = "Borrower still holds books")
    )
)]
pub async fn delete_borrower(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.services.borrowers.delete_borrower(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
