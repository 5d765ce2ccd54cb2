//! Daemon configuration (TOML)
//!
//! ```toml
//! [server]
//! port = 8080
//! public_url = "http://localhost:8080"
//!
//! [gateway]
//! request_timeout_ms = 10000
//!
//! [[things]]
//! path = "things/lamp-1.json"
//!
//! [[routes]]
//! things = ["Lamp 1", "Lamp 2"]
//! properties = ["brightness"]
//!
//! [routes.offering]
//! category = "urn:ids:category:lighting"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use wotgate_core::OfferingMetadata;
use wotgate_gateway::RouteRequest;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub gateway: GatewaySettings,
    #[serde(default)]
    pub things: Vec<ThingSource>,
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
    /// Directory relative Thing paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// URL consumers reach the gateway at; defaults to localhost
    #[serde(default)]
    pub public_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            public_url: None,
        }
    }
}

impl ServerConfig {
    pub fn public_url(&self) -> String {
        self.public_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", self.port))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySettings {
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_fallback_semantic_uri")]
    pub fallback_semantic_uri: String,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            fallback_semantic_uri: default_fallback_semantic_uri(),
        }
    }
}

impl GatewaySettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// A Thing Description file
#[derive(Debug, Clone, Deserialize)]
pub struct ThingSource {
    pub path: PathBuf,
}

/// One route to build and publish
#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    /// Titles of the backing Things, in positional (id) order
    pub things: Vec<String>,
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(default)]
    pub write: bool,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub property_filters: bool,
    #[serde(default)]
    pub offering: OfferingMetadata,
}

impl RouteConfig {
    pub fn to_request(&self) -> RouteRequest {
        RouteRequest {
            properties: self.properties.clone(),
            write: self.write,
            action: self.action.clone(),
            use_property_filters: self.property_filters,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_fallback_semantic_uri() -> String {
    wotgate_core::SchemaTranslator::default()
        .fallback_uri()
        .to_string()
}

impl Config {
    /// Parse a configuration from TOML text
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("Invalid configuration")
    }

    /// Load a configuration file; relative Thing paths resolve against its directory
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(config)
    }

    /// Absolute (or base-relative) paths of all configured Thing files
    pub fn thing_paths(&self) -> Vec<PathBuf> {
        self.things
            .iter()
            .map(|thing| {
                if thing.path.is_absolute() {
                    thing.path.clone()
                } else {
                    self.base_dir.join(&thing.path)
                }
            })
            .collect()
    }
}
