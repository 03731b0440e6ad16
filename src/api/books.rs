//! Catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
};

/// List or search catalog entries
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(BookQuery),
    responses(
        (status = 200, description = "Matching books", body = Vec<Book>)
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.search_books(&query).await?;
    Ok(Json(books))
}

/// Distinct catalog categories
#[utoipa::path(
    get,
    path = "/books/categories",
    tag = "books",
    responses(
        (status = 200, description = "Categories in catalog order", body = Vec<String>)
    )
)]
pub async fn list_categories(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<String>>> {
    Ok(Json(state.services.catalog.categories().await?))
}

/// Get a book by code
#[utoipa::path(
    get,
    path = "/books/{code}",
    tag = "books",
    params(
        ("code" = String, Path, description = "Book code")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<Book>> {
    state
        .services
        .catalog
        .get_book(&code)
        .await?
        .map(Json)
        .ok_or(AppError::BookNotFound(code))
}

/// Add a book to the catalog
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Book code already exists")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    request.validate()?;

    let created = state.services.catalog.add_book(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Edit a book, stock counters included
#[utoipa::path(
    put,
    path = "/books/{code}",
    tag = "books",
    params(
        ("code" = String, Path, description = "Book code")
    ),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    Path(code): Path<String>,
    Json(request): Json<UpdateBook>,
) -> AppResult<Json<Book>> {
    request.validate()?;

    let book = state.services.catalog.update_book(&code, request).await?;
    Ok(Json(book))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{code}",
    tag = "books",
    params(
        ("code" = String, Path, description = "Book code")
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book has unreturned loans")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    Path(code): Path<String>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete_book(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}
