//! Startup: load Things, build routes, publish offerings

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use wotgate_core::{SchemaTranslator, Thing, ThingTransport};
use wotgate_gateway::{publish_route, GatewayRoute, GatewayRouteRegistry, MarketplaceClient};

use crate::config::{Config, RouteConfig};

/// Parse one Thing Description file
pub fn load_thing(path: &Path) -> anyhow::Result<Thing> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read Thing Description {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse Thing Description {}", path.display()))
}

/// Load every configured Thing. Unreadable files abort startup.
pub fn load_things(config: &Config) -> anyhow::Result<Vec<Thing>> {
    config
        .thing_paths()
        .iter()
        .map(|path| {
            let thing = load_thing(path)?;
            tracing::info!(title = %thing.title, path = %path.display(), "Loaded Thing");
            Ok(thing)
        })
        .collect()
}

/// Build and publish every configured route.
///
/// Routes that reference unknown Things, cannot be built or collide with an
/// earlier URI are logged and skipped.
pub async fn build_registry(
    config: &Config,
    things: &[Thing],
    transport: Arc<dyn ThingTransport>,
    marketplace: &dyn MarketplaceClient,
) -> GatewayRouteRegistry {
    let translator = SchemaTranslator::new(config.gateway.fallback_semantic_uri.clone());
    let public_url = config.server.public_url();
    let mut registry = GatewayRouteRegistry::new();

    for route_config in &config.routes {
        let backing = match select_things(route_config, things) {
            Ok(backing) => backing,
            Err(e) => {
                tracing::warn!(things = ?route_config.things, "Skipping route: {:#}", e);
                continue;
            }
        };

        let route = GatewayRoute::build(
            &backing,
            route_config.to_request(),
            Arc::clone(&transport),
            &translator,
        );
        let uri = route.uri().to_string();

        match publish_route(
            &mut registry,
            marketplace,
            route,
            &route_config.offering,
            &public_url,
        )
        .await
        {
            Ok(offering) => tracing::info!(
                uri = %uri,
                endpoint = %offering.endpoint,
                "Route published"
            ),
            Err(e) => tracing::warn!(uri = %uri, error = %e, "Skipping route"),
        }
    }

    registry
}

/// Backing Things of a route, in the configured order
fn select_things(route_config: &RouteConfig, things: &[Thing]) -> anyhow::Result<Vec<Thing>> {
    route_config
        .things
        .iter()
        .map(|title| {
            things
                .iter()
                .find(|thing| &thing.title == title)
                .cloned()
                .with_context(|| format!("Unknown Thing '{}'", title))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wotgate_gateway::testing::MockTransport;
    use wotgate_gateway::LocalCatalog;

    fn lamp(title: &str) -> Thing {
        serde_json::from_value(json!({
            "title": title,
            "base": format!("http://{}.local/", title.replace(' ', "-").to_lowercase()),
            "properties": {
                "level": {"type": "integer", "forms": [{"href": "level"}]},
                "mode": {"type": "string", "forms": [{"href": "mqtt://broker/mode"}]}
            },
            "actions": {
                "toggle": {"forms": [{"href": "toggle", "op": "invokeaction"}]}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_load_things_from_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("lamp.json"),
            serde_json::to_string(&lamp("Lamp 1")).unwrap(),
        )
        .unwrap();

        let mut config = Config::from_toml("[[things]]\npath = \"lamp.json\"").unwrap();
        config.base_dir = dir.path().to_path_buf();

        let things = load_things(&config).unwrap();
        assert_eq!(things.len(), 1);
        assert_eq!(things[0].title, "Lamp 1");
    }

    #[test]
    fn test_load_things_rejects_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();

        let mut config = Config::from_toml("[[things]]\npath = \"broken.json\"").unwrap();
        config.base_dir = dir.path().to_path_buf();

        let err = load_things(&config).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse Thing Description"));
    }

    #[tokio::test]
    async fn test_build_registry_skips_bad_routes() {
        let config = Config::from_toml(
            r#"
[server]
public_url = "http://gw.test"

[[routes]]
things = ["Lamp 1", "Lamp 2"]
properties = ["level"]

[[routes]]
things = ["Lamp 1"]
action = "toggle"

[[routes]]
things = ["Lamp 1"]
properties = ["mode"]

[[routes]]
things = ["Lamp 9"]
properties = ["level"]

[[routes]]
things = ["Lamp 1", "Lamp 3"]
properties = ["level"]
"#,
        )
        .unwrap();
        let things = vec![lamp("Lamp 1"), lamp("Lamp 2"), lamp("Lamp 3")];
        let catalog = LocalCatalog::new();

        let registry =
            build_registry(&config, &things, Arc::new(MockTransport::new()), &catalog).await;

        let uris: Vec<_> = registry.routes().iter().map(|r| r.uri()).collect();
        assert_eq!(uris, vec!["Lamp1-Read-level", "Lamp1-toggle"]);
        assert!(registry.routes().iter().all(|r| r.is_registered()));
        assert_eq!(catalog.len(), 2);

        let offerings = catalog.list().await.unwrap();
        assert_eq!(offerings[0].endpoint, "http://gw.test/gateway/Lamp1-Read-level");
    }
}
