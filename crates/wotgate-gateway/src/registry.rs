//! GatewayRouteRegistry - owns routes and dispatches proxied requests

use std::collections::HashMap;

use tracing::{debug, info};
use wotgate_core::{FlatRecord, GatewayError, GatewayResult, Method};

use crate::route::{AccessResult, GatewayRoute, RangeFilters};

/// Routes by URI, kept in registration order
#[derive(Debug, Default)]
pub struct GatewayRouteRegistry {
    routes: Vec<GatewayRoute>,
    by_uri: HashMap<String, usize>,
}

impl GatewayRouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route.
    ///
    /// Fails with `DuplicateUri` if the URI is taken and `RouteInvalid` if
    /// the route could not be built.
    pub fn add_route(&mut self, route: GatewayRoute) -> GatewayResult<()> {
        self.check_route(&route)?;

        info!(uri = %route.uri(), method = %route.method(), things = route.things().len(), "Registering gateway route");
        self.by_uri.insert(route.uri().to_string(), self.routes.len());
        self.routes.push(route);
        Ok(())
    }

    /// Check that `route` could be added without adding it
    pub fn check_route(&self, route: &GatewayRoute) -> GatewayResult<()> {
        if self.contains(route.uri()) {
            return Err(GatewayError::DuplicateUri(route.uri().to_string()));
        }
        if !route.is_valid() {
            return Err(GatewayError::RouteInvalid(
                route
                    .invalid_reason()
                    .unwrap_or_else(|| route.uri())
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Remove a route by URI
    pub fn remove_route(&mut self, uri: &str) -> Option<GatewayRoute> {
        let index = self.by_uri.remove(uri)?;
        let route = self.routes.remove(index);
        for position in self.by_uri.values_mut() {
            if *position > index {
                *position -= 1;
            }
        }
        info!(uri = %uri, "Removed gateway route");
        Some(route)
    }

    pub fn get(&self, uri: &str) -> Option<&GatewayRoute> {
        self.by_uri.get(uri).map(|index| &self.routes[*index])
    }

    pub fn get_mut(&mut self, uri: &str) -> Option<&mut GatewayRoute> {
        let index = *self.by_uri.get(uri)?;
        self.routes.get_mut(index)
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.by_uri.contains_key(uri)
    }

    /// All routes, in registration order
    pub fn routes(&self) -> &[GatewayRoute] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Look up `uri`, check `method`, and access the route
    pub async fn dispatch(
        &self,
        uri: &str,
        method: Method,
        params: &FlatRecord,
        id: Option<i64>,
        filters: Option<&RangeFilters>,
    ) -> GatewayResult<AccessResult> {
        let route = self
            .get(uri)
            .ok_or_else(|| GatewayError::RouteNotFound(uri.to_string()))?;

        if route.method() != method {
            return Err(GatewayError::MethodMismatch {
                uri: uri.to_string(),
                expected: route.method(),
                actual: method,
            });
        }

        debug!(uri = %uri, method = %method, id = ?id, "Dispatching gateway request");
        route.access(params, id, filters).await
    }
}
