//! wotgate-core - Core traits and types for the WoT/Offering gateway
//!
//! This crate provides the Thing Description and Offering models, form
//! resolution, the error taxonomy, and the [`ThingTransport`] seam that
//! wire clients implement.

pub mod error;
pub mod forms;
pub mod models;
pub mod routing;
pub mod transport;

pub use error::{ErrorKind, GatewayError, GatewayResult};
pub use forms::{resolve_form, InteractionDescriptor, DEFAULT_CONTENT_TYPE};
pub use models::*;
pub use transport::ThingTransport;

// Re-export schema types for convenience
pub use wotgate_conv::{DataField, DataSchema, FlatRecord, JsonLdContext, SchemaTranslator};
