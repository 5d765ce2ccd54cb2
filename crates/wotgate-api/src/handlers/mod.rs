//! HTTP request handlers for the wotgate API

pub mod offerings;
pub mod proxy;
pub mod routes;
