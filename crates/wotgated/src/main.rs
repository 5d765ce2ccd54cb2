//! wotgated - WoT/Offering Gateway Daemon
//!
//! Exposes WoT Things as marketplace Offerings through synthesized proxy
//! routes.
//!
//! Usage:
//!   wotgated [OPTIONS] <config.toml>

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wotgate_api::{create_router, AppState};
use wotgate_client::ThingClient;
use wotgate_gateway::LocalCatalog;
use wotgated::{build_registry, load_things, Config};

#[derive(Parser)]
#[command(name = "wotgated")]
#[command(author, version, about = "WoT Thing to marketplace Offering gateway")]
struct Cli {
    /// Gateway configuration file (TOML)
    config: PathBuf,

    /// Listen port (overrides [server] port)
    #[arg(short, long, env = "WOTGATE_PORT")]
    port: Option<u16>,

    /// Public base URL of the gateway (overrides [server] public_url)
    #[arg(long, env = "WOTGATE_PUBLIC_URL")]
    public_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "wotgated=info,wotgate_api=info,wotgate_gateway=info,wotgate_client=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting wotgated (WoT/Offering Gateway Daemon)");

    let cli = Cli::parse();

    tracing::info!("Loading config from: {}", cli.config.display());
    let mut config = Config::load(&cli.config)?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(public_url) = cli.public_url {
        config.server.public_url = Some(public_url);
    }

    let things = load_things(&config)?;
    tracing::info!("Loaded {} Thing Descriptions", things.len());

    let transport = Arc::new(
        ThingClient::with_timeout(config.gateway.request_timeout())
            .context("Failed to create Thing client")?,
    );
    let catalog = Arc::new(LocalCatalog::new());

    let registry = build_registry(&config, &things, transport, catalog.as_ref()).await;
    if registry.is_empty() {
        tracing::warn!("No routes were published");
    } else {
        tracing::info!(
            "Published {} of {} configured routes",
            registry.len(),
            config.routes.len()
        );
    }

    let state = AppState::new(registry, catalog);
    let app = create_router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Public URL: {}", config.server.public_url());

    // Run the server
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("wotgated stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
