//! Gateway route listing handlers

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use wotgate_gateway::RouteSummary;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct RouteListResponse {
    pub count: usize,
    pub items: Vec<RouteSummary>,
}

/// GET /routes
pub async fn list_routes(State(state): State<AppState>) -> Json<RouteListResponse> {
    let items: Vec<RouteSummary> = state
        .registry()
        .routes()
        .iter()
        .map(|route| route.summary())
        .collect();

    Json(RouteListResponse {
        count: items.len(),
        items,
    })
}

/// GET /routes/{uri}
pub async fn get_route(
    State(state): State<AppState>,
    Path(uri): Path<String>,
) -> Result<Json<RouteSummary>, ApiError> {
    state
        .registry()
        .get(&uri)
        .map(|route| Json(route.summary()))
        .ok_or_else(|| ApiError::NotFound(format!("Route not found: {}", uri)))
}
