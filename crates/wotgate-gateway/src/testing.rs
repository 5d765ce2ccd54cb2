//! Test utilities for gateway routes
//!
//! [`MockTransport`] stands in for real Things: responses, latency and
//! failures are configured per URL, and every request is recorded.
//!
//! ```rust
//! use serde_json::json;
//! use wotgate_gateway::testing::MockTransport;
//!
//! let transport = MockTransport::new();
//! transport.respond("http://lamp-1/level", json!(40));
//! assert_eq!(transport.call_count(), 0);
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use wotgate_core::{GatewayError, GatewayResult, InteractionDescriptor, Method, ThingTransport};

/// A request seen by [`MockTransport`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub thing: String,
    pub url: String,
    pub method: Method,
    pub body: Option<Vec<u8>>,
}

impl RecordedRequest {
    /// Body parsed as JSON, if any
    pub fn body_json(&self) -> Option<Value> {
        self.body
            .as_deref()
            .and_then(|body| serde_json::from_slice(body).ok())
    }
}

#[derive(Default)]
struct MockState {
    responses: HashMap<String, Vec<u8>>,
    delays: HashMap<String, Duration>,
    failures: HashSet<String>,
    requests: Vec<RecordedRequest>,
}

/// In-memory [`ThingTransport`] keyed by request URL
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests to `url` with `value` as JSON
    pub fn respond(&self, url: &str, value: Value) {
        self.respond_raw(url, value.to_string().as_bytes());
    }

    /// Answer requests to `url` with a raw payload
    pub fn respond_raw(&self, url: &str, payload: &[u8]) {
        let mut state = self.state.lock();
        state.failures.remove(url);
        state.responses.insert(url.to_string(), payload.to_vec());
    }

    /// Delay answers for `url`
    pub fn delay(&self, url: &str, delay: Duration) {
        self.state.lock().delays.insert(url.to_string(), delay);
    }

    /// Make requests to `url` fail as unreachable
    pub fn fail(&self, url: &str) {
        self.state.lock().failures.insert(url.to_string());
    }

    /// All requests seen so far, in arrival order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().requests.len()
    }
}

#[async_trait]
impl ThingTransport for MockTransport {
    async fn send(
        &self,
        descriptor: &InteractionDescriptor,
        body: Option<&[u8]>,
    ) -> GatewayResult<Vec<u8>> {
        let url = descriptor.url.to_string();

        let (delay, outcome) = {
            let mut state = self.state.lock();
            state.requests.push(RecordedRequest {
                thing: descriptor.thing.clone(),
                url: url.clone(),
                method: descriptor.method,
                body: body.map(<[u8]>::to_vec),
            });

            let outcome = if state.failures.contains(&url) {
                Err("connection refused".to_string())
            } else {
                state
                    .responses
                    .get(&url)
                    .cloned()
                    .ok_or_else(|| "no mock response".to_string())
            };
            (state.delays.get(&url).copied(), outcome)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        outcome.map_err(|message| GatewayError::ThingUnreachable {
            thing: descriptor.thing.clone(),
            message: format!("{} {}: {}", descriptor.method, url, message),
        })
    }
}
