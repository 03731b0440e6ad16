//! Statistics endpoints

use axum::{extract::Query, extract::State, Json};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::AppResult,
    models::stats::{BookCirculation, DashboardStats},
};

const DEFAULT_TOP_LIMIT: usize = 5;

#[derive(Debug, Deserialize, IntoParams)]
pub struct MostBorrowedQuery {
    /// Number of titles to return (default 5)
    pub limit: Option<usize>,
}

/// Dashboard counters
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Stock, registry and loan counters", body = DashboardStats)
    )
)]
pub async fn get_stats(State(state): State<crate::AppState>) -> AppResult<Json<DashboardStats>> {
    Ok(Json(state.services.stats.dashboard_stats().await?))
}

/// Titles with the most copies out
#[utoipa::path(
    get,
    path = "/stats/most-borrowed",
    tag = "stats",
    params(MostBorrowedQuery),
    responses(
        (status = 200, description = "Titles by copies on loan", body = Vec<BookCirculation>)
    )
)]
pub async fn get_most_borrowed(
    State(state): State<crate::AppState>,
    Query(query): Query<MostBorrowedQuery>,
) -> AppResult<Json<Vec<BookCirculation>>> {
    let limit = query.limit.unwrap_or(DEFAULT_TOP_LIMIT);
    Ok(Json(state.services.stats.most_borrowed(limit).await?))
}
