//! Marketplace publishing - routes become Offerings
//!
//! The marketplace itself sits behind [`MarketplaceClient`]. [`LocalCatalog`]
//! is the in-process implementation the daemon serves from `/offerings`.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tracing::info;
use wotgate_core::routing::route_url;
use wotgate_core::{GatewayError, GatewayResult, Offering, OfferingMetadata};

use crate::registry::GatewayRouteRegistry;
use crate::route::GatewayRoute;

/// Provider-side marketplace operations
#[async_trait]
pub trait MarketplaceClient: Send + Sync {
    /// Register an offering and return its marketplace id
    async fn register(&self, offering: &Offering) -> GatewayResult<String>;

    async fn delete(&self, offering_id: &str) -> GatewayResult<()>;

    async fn get(&self, offering_id: &str) -> GatewayResult<Option<Offering>>;

    /// All offerings, in registration order
    async fn list(&self) -> GatewayResult<Vec<Offering>>;
}

/// In-memory offering catalog
#[derive(Debug, Default)]
pub struct LocalCatalog {
    offerings: RwLock<Vec<Offering>>,
}

impl LocalCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.offerings.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.offerings.read().is_empty()
    }
}

#[async_trait]
impl MarketplaceClient for LocalCatalog {
    async fn register(&self, offering: &Offering) -> GatewayResult<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let mut stored = offering.clone();
        stored.id = Some(id.clone());
        self.offerings.write().push(stored);
        Ok(id)
    }

    async fn delete(&self, offering_id: &str) -> GatewayResult<()> {
        let mut offerings = self.offerings.write();
        let before = offerings.len();
        offerings.retain(|o| o.id.as_deref() != Some(offering_id));
        if offerings.len() == before {
            return Err(GatewayError::Marketplace(format!(
                "Offering not found: {}",
                offering_id
            )));
        }
        Ok(())
    }

    async fn get(&self, offering_id: &str) -> GatewayResult<Option<Offering>> {
        Ok(self
            .offerings
            .read()
            .iter()
            .find(|o| o.id.as_deref() == Some(offering_id))
            .cloned())
    }

    async fn list(&self) -> GatewayResult<Vec<Offering>> {
        Ok(self.offerings.read().clone())
    }
}

/// Describe `route` as an (unregistered) Offering served below `public_url`
pub fn offering_for_route(
    route: &GatewayRoute,
    metadata: &OfferingMetadata,
    public_url: &str,
) -> Offering {
    Offering {
        id: None,
        name: metadata
            .name
            .clone()
            .unwrap_or_else(|| route.uri().to_string()),
        description: metadata.description.clone(),
        category: metadata.category.clone(),
        license: metadata.license.clone(),
        price: metadata.price,
        endpoint: route_url(public_url, route.uri()),
        method: route.method(),
        inputs: route.input_schema().to_vec(),
        outputs: route.output_schema().to_vec(),
        property_filters: route.property_filters_schema().to_vec(),
        spatial_extent: metadata.spatial_extent,
        created_at: Utc::now(),
    }
}

/// Publish `route` on the marketplace and add it to `registry`.
///
/// Invalid routes and taken URIs are rejected before anything is sent to
/// the marketplace.
pub async fn publish_route(
    registry: &mut GatewayRouteRegistry,
    marketplace: &dyn MarketplaceClient,
    mut route: GatewayRoute,
    metadata: &OfferingMetadata,
    public_url: &str,
) -> GatewayResult<Offering> {
    registry.check_route(&route)?;

    let mut offering = offering_for_route(&route, metadata, public_url);
    let offering_id = marketplace.register(&offering).await?;
    info!(uri = %route.uri(), offering_id = %offering_id, "Published route as offering");

    offering.id = Some(offering_id.clone());
    route.mark_registered(offering_id);
    registry.add_route(route)?;
    Ok(offering)
}

/// Withdraw the offering of route `uri` and remove the route
pub async fn unpublish_route(
    registry: &mut GatewayRouteRegistry,
    marketplace: &dyn MarketplaceClient,
    uri: &str,
) -> GatewayResult<GatewayRoute> {
    let route = registry
        .get(uri)
        .ok_or_else(|| GatewayError::RouteNotFound(uri.to_string()))?;

    if let Some(offering_id) = route.offering_id() {
        marketplace.delete(offering_id).await?;
        info!(uri = %uri, offering_id = %offering_id, "Withdrew offering");
    }

    registry
        .remove_route(uri)
        .ok_or_else(|| GatewayError::RouteNotFound(uri.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::RouteRequest;
    use crate::testing::MockTransport;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use wotgate_core::{DataSchema, Form, Method, PropertyAffordance, SchemaTranslator, Thing};

    fn meter(n: usize) -> Thing {
        Thing::new(format!("Meter {}", n)).with_property(
            "power",
            PropertyAffordance::new(
                DataSchema::primitive("number"),
                vec![Form::new(format!("http://meter-{}/power", n))],
            ),
        )
    }

    fn route(count: usize, request: RouteRequest) -> GatewayRoute {
        let things: Vec<_> = (0..count).map(meter).collect();
        GatewayRoute::build(
            &things,
            request,
            Arc::new(MockTransport::new()),
            &SchemaTranslator::default(),
        )
    }

    fn metadata() -> OfferingMetadata {
        OfferingMetadata {
            category: "urn:ids:category:energy".into(),
            license: "https://creativecommons.org/licenses/by/4.0/".into(),
            price: 0.5,
            ..OfferingMetadata::default()
        }
    }

    #[test]
    fn test_offering_for_route() {
        let offering = offering_for_route(
            &route(2, RouteRequest::write("power")),
            &metadata(),
            "http://gw.local:8080/",
        );
        assert_eq!(offering.name, "Meter0-Write-power");
        assert_eq!(offering.endpoint, "http://gw.local:8080/gateway/Meter0-Write-power");
        assert_eq!(offering.method, Method::Post);
        let inputs: Vec<_> = offering.inputs.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(inputs, vec!["power", "id"]);
        assert!(offering.outputs.is_empty());
        assert!(offering.id.is_none());
    }

    #[tokio::test]
    async fn test_publish_and_unpublish() {
        let catalog = LocalCatalog::new();
        let mut registry = GatewayRouteRegistry::new();

        let offering = publish_route(
            &mut registry,
            &catalog,
            route(1, RouteRequest::read(["power"])),
            &metadata(),
            "http://gw.local:8080",
        )
        .await
        .unwrap();

        let id = offering.id.clone().unwrap();
        let published = registry.get("Meter0-Read-power").unwrap();
        assert!(published.is_registered());
        assert_eq!(published.offering_id(), Some(id.as_str()));
        assert_eq!(catalog.get(&id).await.unwrap(), Some(offering));

        let removed = unpublish_route(&mut registry, &catalog, "Meter0-Read-power")
            .await
            .unwrap();
        assert_eq!(removed.uri(), "Meter0-Read-power");
        assert!(registry.is_empty());
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn test_publish_rejects_before_registering() {
        let catalog = LocalCatalog::new();
        let mut registry = GatewayRouteRegistry::new();

        publish_route(
            &mut registry,
            &catalog,
            route(1, RouteRequest::read(["power"])),
            &metadata(),
            "http://gw",
        )
        .await
        .unwrap();

        let err = publish_route(
            &mut registry,
            &catalog,
            route(1, RouteRequest::read(["power"])),
            &metadata(),
            "http://gw",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, GatewayError::DuplicateUri(_)));

        let err = publish_route(
            &mut registry,
            &catalog,
            route(1, RouteRequest::read(["missing"])),
            &metadata(),
            "http://gw",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, GatewayError::RouteInvalid(_)));
        assert_eq!(catalog.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_unknown_offering() {
        let catalog = LocalCatalog::new();
        let err = catalog.delete("nope").await.unwrap_err();
        assert!(matches!(err, GatewayError::Marketplace(_)));
    }
}
