//! wotgate-gateway - Gateway routes over WoT Things
//!
//! This crate turns Thing interactions into synthesized proxy endpoints and
//! publishes them as marketplace Offerings.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      GatewayRouteRegistry                        │
//! │   uri ──▶ GatewayRoute (method, flat schemas, valid, registered) │
//! └───────────────────────────────┬──────────────────────────────────┘
//!                                 │ access(params, id?, filters?)
//!               ┌─────────────────┼─────────────────┐
//!               ▼                 ▼                 ▼
//!        ThingRequester    ThingRequester    ThingRequester
//!          (Thing 0)         (Thing 1)         (Thing 2)
//!               │                 │                 │
//!               └────────── ThingTransport ─────────┘
//!                          (HTTP / CoAP client)
//! ```
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use wotgate_core::{DataSchema, Form, Method, PropertyAffordance, SchemaTranslator, Thing};
//! use wotgate_gateway::testing::MockTransport;
//! use wotgate_gateway::{GatewayRoute, GatewayRouteRegistry, RouteRequest};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let lamp = Thing::new("Lamp").with_property(
//!     "level",
//!     PropertyAffordance::new(DataSchema::primitive("integer"), vec![Form::new("http://lamp/level")]),
//! );
//!
//! let transport = MockTransport::new();
//! transport.respond("http://lamp/level", json!(80));
//!
//! let route = GatewayRoute::build(
//!     &[lamp],
//!     RouteRequest::read(["level"]),
//!     Arc::new(transport),
//!     &SchemaTranslator::default(),
//! );
//!
//! let mut registry = GatewayRouteRegistry::new();
//! registry.add_route(route).unwrap();
//!
//! let result = registry
//!     .dispatch("Lamp-Read-level", Method::Get, &Default::default(), None, None)
//!     .await
//!     .unwrap();
//! assert_eq!(result.records[0]["level"], json!(80));
//! # }
//! ```

pub mod marketplace;
pub mod registry;
pub mod requester;
pub mod route;
pub mod testing;

pub use marketplace::{
    offering_for_route, publish_route, unpublish_route, LocalCatalog, MarketplaceClient,
};
pub use registry::GatewayRouteRegistry;
pub use requester::ThingRequester;
pub use route::{
    passes_filters, AccessResult, GatewayRoute, RangeFilters, RouteKind, RouteRequest,
    RouteSummary, ThingFailure, ID_FIELD, MAX_FILTER_PREFIX, MIN_FILTER_PREFIX,
};

// Re-export core types for convenience
pub use wotgate_core::{FlatRecord, GatewayError, GatewayResult, Method};
