//! Offering catalog handlers

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use wotgate_core::Offering;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct OfferingListResponse {
    pub count: usize,
    pub items: Vec<Offering>,
}

/// GET /offerings
pub async fn list_offerings(
    State(state): State<AppState>,
) -> Result<Json<OfferingListResponse>, ApiError> {
    let items = state.marketplace().list().await?;
    Ok(Json(OfferingListResponse {
        count: items.len(),
        items,
    }))
}

/// GET /offerings/{offering_id}
pub async fn get_offering(
    State(state): State<AppState>,
    Path(offering_id): Path<String>,
) -> Result<Json<Offering>, ApiError> {
    state
        .marketplace()
        .get(&offering_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Offering not found: {}", offering_id)))
}
