//! wotgate-api - REST API layer for the WoT/Offering gateway
//!
//! Serves the registered gateway routes to marketplace consumers, plus
//! read-only views of the routes and the offering catalog.
//!
//! # Usage
//!
//! ```ignore
//! use wotgate_api::{create_router, AppState};
//!
//! let state = AppState::new(registry, marketplace);
//! let router = create_router(state);
//! ```

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use handlers::proxy::FAILED_THINGS_HEADER;
pub use state::AppState;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the wotgate REST API router with the given application state
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Route introspection
        .route("/routes", get(handlers::routes::list_routes))
        .route("/routes/{uri}", get(handlers::routes::get_route))
        // Offering catalog
        .route("/offerings", get(handlers::offerings::list_offerings))
        .route(
            "/offerings/{offering_id}",
            get(handlers::offerings::get_offering),
        )
        // Gateway proxy
        .route(
            "/gateway/{uri}",
            get(handlers::proxy::get_gateway)
                .post(handlers::proxy::post_gateway)
                .put(handlers::proxy::put_gateway),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
