//! WoT Thing Client Library
//!
//! Sends resolved gateway requests to Things over HTTP (reqwest) or CoAP
//! (coap-lite over tokio UDP). [`ThingClient`] implements
//! [`wotgate_core::ThingTransport`], so it plugs directly into gateway routes.
//!
//! # Example
//!
//! ```rust,no_run
//! use wotgate_client::ThingClient;
//! use wotgate_core::{InteractionDescriptor, Thing, ThingTransport, Verb};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let thing: Thing = serde_json::from_str(&std::fs::read_to_string("lamp.td.json")?)?;
//!     let descriptor = InteractionDescriptor::for_property(&thing, "level", Verb::Read)?;
//!
//!     let client = ThingClient::new()?;
//!     let payload = client.send(&descriptor, None).await?;
//!     println!("{}", String::from_utf8_lossy(&payload));
//!     Ok(())
//! }
//! ```

mod client;
mod coap;
mod error;

pub use client::{ThingClient, DEFAULT_TIMEOUT};
pub use coap::DEFAULT_COAP_PORT;
pub use error::{Result, ThingClientError};
