//! End-to-end test support for wotgate
//!
//! This crate drives the whole stack against real sockets:
//! - [`MockHttpThing`]: an axum server with WoT-style property and action endpoints
//! - [`MockCoapThing`]: a UDP responder speaking confirmable CoAP via coap-lite
//! - [`GatewayServer`]: the wotgate API router on an ephemeral port
//!
//! # Test Structure
//!
//! - `gateway_e2e_test.rs` - HTTP Things behind aggregated and merged routes
//! - `coap_e2e_test.rs` - CoAP Things through the gateway
//! - `daemon_config_test.rs` - TOML config + TD files through the daemon bootstrap

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use coap_lite::{MessageClass, MessageType, Packet, RequestType, ResponseType};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::{TcpListener, UdpSocket};
use wotgate_core::Thing;

/// Shared state of a mock Thing: current property values and action log
#[derive(Clone, Default)]
pub struct ThingState {
    properties: Arc<Mutex<HashMap<String, Value>>>,
    invocations: Arc<Mutex<Vec<(String, Value)>>>,
}

impl ThingState {
    pub fn set(&self, name: &str, value: Value) {
        self.properties.lock().insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.properties.lock().get(name).cloned()
    }

    /// Actions invoked so far, with their inputs
    pub fn invocations(&self) -> Vec<(String, Value)> {
        self.invocations.lock().clone()
    }
}

/// A WoT Thing served over HTTP on an ephemeral port
pub struct MockHttpThing {
    pub addr: SocketAddr,
    pub state: ThingState,
    handle: tokio::task::JoinHandle<()>,
}

impl MockHttpThing {
    /// Start a Thing, optionally delaying every answer
    pub async fn start(delay: Option<Duration>) -> std::io::Result<Self> {
        let state = ThingState::default();
        let router = Router::new()
            .route(
                "/properties/{name}",
                get(read_property).put(write_property),
            )
            .route("/actions/{name}", post(invoke_action))
            .with_state((state.clone(), delay));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        Ok(Self {
            addr,
            state,
            handle,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Sensor TD served by this Thing
    ///
    /// Properties: `temperature` (number), `status` (object: `power`, `mode`).
    /// Action: `configure` (input object: `mode`, `interval`).
    pub fn sensor_description(&self, title: &str) -> Thing {
        let td = json!({
            "@context": [
                "https://www.w3.org/2019/wot/td/v1",
                {"saref": "https://w3id.org/saref#"}
            ],
            "title": title,
            "base": self.base_url(),
            "properties": {
                "temperature": {
                    "type": "number",
                    "forms": [
                        {"href": "properties/temperature", "op": "readproperty"},
                        {"href": "properties/temperature", "op": "writeproperty", "htv:methodName": "PUT"}
                    ]
                },
                "status": {
                    "type": "object",
                    "properties": {
                        "power": {"@type": "saref:OnOffState", "type": "boolean"},
                        "mode": {"type": "string"}
                    },
                    "forms": [{"href": "properties/status"}]
                }
            },
            "actions": {
                "configure": {
                    "input": {
                        "type": "object",
                        "properties": {
                            "mode": {"type": "string"},
                            "interval": {"type": "integer"}
                        }
                    },
                    "forms": [{"href": "actions/configure", "op": "invokeaction"}]
                }
            }
        });
        serde_json::from_value(td).unwrap_or_default()
    }
}

impl Drop for MockHttpThing {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

type HttpThingState = (ThingState, Option<Duration>);

async fn read_property(
    State((state, delay)): State<HttpThingState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    state.get(&name).map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn write_property(
    State((state, _)): State<HttpThingState>,
    Path(name): Path<String>,
    Json(value): Json<Value>,
) -> StatusCode {
    state.set(&name, value);
    StatusCode::NO_CONTENT
}

async fn invoke_action(
    State((state, _)): State<HttpThingState>,
    Path(name): Path<String>,
    Json(input): Json<Value>,
) -> Json<Value> {
    state.invocations.lock().push((name, input));
    Json(json!({}))
}

/// A WoT Thing served over CoAP/UDP on an ephemeral port
///
/// GET returns the stored JSON for the path, PUT and POST store the payload.
/// Answers are piggybacked on the ACK.
pub struct MockCoapThing {
    pub addr: SocketAddr,
    pub state: ThingState,
    handle: tokio::task::JoinHandle<()>,
}

impl MockCoapThing {
    pub async fn start() -> std::io::Result<Self> {
        let socket = UdpSocket::bind("127.0.0.1:0").await?;
        let addr = socket.local_addr()?;
        let state = ThingState::default();

        let served = state.clone();
        let handle = tokio::spawn(async move {
            let mut buf = [0u8; 1500];
            loop {
                let Ok((n, peer)) = socket.recv_from(&mut buf).await else {
                    break;
                };
                let Ok(request) = Packet::from_bytes(&buf[..n]) else {
                    continue;
                };
                // Empty ACKs from the client need no answer
                if request.header.code == MessageClass::Empty {
                    continue;
                }
                let reply = coap_reply(&served, &request);
                if let Ok(bytes) = reply.to_bytes() {
                    let _ = socket.send_to(&bytes, peer).await;
                }
            }
        });

        Ok(Self {
            addr,
            state,
            handle,
        })
    }

    /// Meter TD with one CoAP property `power` (number) and a writable `limit`
    pub fn meter_description(&self, title: &str) -> Thing {
        let base = format!("coap://{}", self.addr);
        let td = json!({
            "title": title,
            "properties": {
                "power": {
                    "type": "number",
                    "forms": [{"href": format!("{}/power", base)}]
                },
                "limit": {
                    "type": "integer",
                    "forms": [
                        {"href": format!("{}/limit", base), "op": "readproperty"},
                        {"href": format!("{}/limit", base), "op": "writeproperty", "cov:methodName": "0.03"}
                    ]
                }
            }
        });
        serde_json::from_value(td).unwrap_or_default()
    }
}

impl Drop for MockCoapThing {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn coap_reply(state: &ThingState, request: &Packet) -> Packet {
    let path = request
        .get_option(coap_lite::CoapOption::UriPath)
        .map(|segments| {
            segments
                .iter()
                .map(|s| String::from_utf8_lossy(s).into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default();

    let (code, payload) = match request.header.code {
        MessageClass::Request(RequestType::Get) => match state.get(&path) {
            Some(value) => (ResponseType::Content, value.to_string().into_bytes()),
            None => (ResponseType::NotFound, Vec::new()),
        },
        MessageClass::Request(RequestType::Put | RequestType::Post) => {
            match serde_json::from_slice::<Value>(&request.payload) {
                Ok(value) => {
                    state.set(&path, value);
                    (ResponseType::Changed, Vec::new())
                }
                Err(_) => (ResponseType::BadRequest, Vec::new()),
            }
        }
        _ => (ResponseType::MethodNotAllowed, Vec::new()),
    };

    let mut reply = Packet::new();
    reply.header.set_version(1);
    reply.header.set_type(MessageType::Acknowledgement);
    reply.header.code = MessageClass::Response(code);
    reply.header.message_id = request.header.message_id;
    reply.set_token(request.get_token().to_vec());
    reply.payload = payload;
    reply
}

/// The wotgate API on an ephemeral port
pub struct GatewayServer {
    pub addr: SocketAddr,
    pub http: reqwest::Client,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl GatewayServer {
    pub async fn start(router: Router) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(std::io::Error::other)?;

        Ok(Self {
            addr,
            http,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// URL of a gateway route
    pub fn route_url(&self, uri: &str) -> String {
        wotgate_core::routing::route_url(&self.base_url(), uri)
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for GatewayServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
