//! Application state for the wotgate API

use std::sync::Arc;

use wotgate_gateway::{GatewayRouteRegistry, LocalCatalog, MarketplaceClient};

/// Application state shared across all handlers
///
/// The registry is fully built before the server starts and is read-only
/// from then on.
#[derive(Clone)]
pub struct AppState {
    registry: Arc<GatewayRouteRegistry>,
    marketplace: Arc<dyn MarketplaceClient>,
}

impl AppState {
    pub fn new(registry: GatewayRouteRegistry, marketplace: Arc<dyn MarketplaceClient>) -> Self {
        Self {
            registry: Arc::new(registry),
            marketplace,
        }
    }

    /// State with an empty in-memory catalog
    pub fn with_local_catalog(registry: GatewayRouteRegistry) -> Self {
        Self::new(registry, Arc::new(LocalCatalog::new()))
    }

    pub fn registry(&self) -> &GatewayRouteRegistry {
        &self.registry
    }

    pub fn marketplace(&self) -> &dyn MarketplaceClient {
        self.marketplace.as_ref()
    }
}
