//! wotgated - WoT/Offering gateway daemon
//!
//! Loads Thing Descriptions, builds the configured gateway routes, publishes
//! them to the offering catalog and serves them over HTTP.

pub mod bootstrap;
pub mod config;

pub use bootstrap::{build_registry, load_thing, load_things};
pub use config::Config;
