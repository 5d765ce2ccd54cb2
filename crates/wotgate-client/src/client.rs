//! Thing client implementation

use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};
use wotgate_core::{GatewayError, GatewayResult, InteractionDescriptor, Method, Protocol, ThingTransport};

use crate::coap;
use crate::error::{Result, ThingClientError};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for issuing gateway requests to Things over HTTP or CoAP
///
/// Every request is bounded by the configured timeout.
#[derive(Debug)]
pub struct ThingClient {
    http: Client,
    timeout: Duration,
    next_message_id: AtomicU16,
}

impl ThingClient {
    /// Create a new client with the default timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a new client with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
            .build()?;

        Ok(Self {
            http,
            timeout,
            next_message_id: AtomicU16::new(1),
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Perform an HTTP request; only 200 and 204 count as success
    #[instrument(skip(self, body), fields(url = %descriptor.url, method = %descriptor.method))]
    pub async fn send_http(
        &self,
        descriptor: &InteractionDescriptor,
        body: Option<&[u8]>,
    ) -> Result<Vec<u8>> {
        let url = descriptor.url.clone();
        let mut request = match descriptor.method {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url),
            Method::Put => self.http.put(url),
        };

        if let (Some(body), false) = (body, descriptor.method == Method::Get) {
            request = request
                .header(CONTENT_TYPE, descriptor.content_type.as_str())
                .body(body.to_vec());
        }

        let response = request.send().await.map_err(Self::map_reqwest)?;
        let status = response.status();
        debug!(status = %status, "Thing responded");

        if !matches!(status, StatusCode::OK | StatusCode::NO_CONTENT) {
            let message = response.text().await.unwrap_or_default();
            return Err(ThingClientError::status_error(status, message));
        }

        let payload = response.bytes().await.map_err(Self::map_reqwest)?;
        Ok(payload.to_vec())
    }

    /// Perform a confirmable CoAP request
    #[instrument(skip(self, body), fields(url = %descriptor.url, method = %descriptor.method))]
    pub async fn send_coap(
        &self,
        descriptor: &InteractionDescriptor,
        body: Option<&[u8]>,
    ) -> Result<Vec<u8>> {
        let message_id = self.next_message_id.fetch_add(1, Ordering::Relaxed);
        let request = coap::CoapExchange {
            url: &descriptor.url,
            method: descriptor.method,
            content_type: &descriptor.content_type,
            payload: body,
            message_id,
        };
        request.run(self.timeout).await
    }

    fn map_reqwest(e: reqwest::Error) -> ThingClientError {
        if e.is_timeout() {
            ThingClientError::Timeout
        } else {
            ThingClientError::HttpError(e)
        }
    }

    /// Map a ThingClientError to a GatewayError for the given Thing
    fn map_err(descriptor: &InteractionDescriptor, e: ThingClientError) -> GatewayError {
        GatewayError::ThingUnreachable {
            thing: descriptor.thing.clone(),
            message: format!("{} {}: {}", descriptor.method, descriptor.url, e),
        }
    }
}

#[async_trait]
impl ThingTransport for ThingClient {
    async fn send(
        &self,
        descriptor: &InteractionDescriptor,
        body: Option<&[u8]>,
    ) -> GatewayResult<Vec<u8>> {
        let result = match descriptor.protocol {
            Protocol::Http => self.send_http(descriptor, body).await,
            Protocol::Coap => self.send_coap(descriptor, body).await,
        };
        result.map_err(|e| Self::map_err(descriptor, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    use axum::routing::{get, post};
    use axum::Router;
    use tokio::net::TcpListener;
    use wotgate_core::{DataSchema, Form, PropertyAffordance, Thing, Verb};

    async fn serve(router: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });
        addr
    }

    fn descriptor(href: String, verb: Verb) -> InteractionDescriptor {
        let thing = Thing::new("Probe").with_property(
            "value",
            PropertyAffordance::new(DataSchema::primitive("number"), vec![Form::new(href)]),
        );
        InteractionDescriptor::for_property(&thing, "value", verb).unwrap()
    }

    #[tokio::test]
    async fn test_http_get_returns_body() {
        let addr = serve(Router::new().route("/value", get(|| async { "42" }))).await;
        let client = ThingClient::new().unwrap();

        let payload = client
            .send(&descriptor(format!("http://{}/value", addr), Verb::Read), None)
            .await
            .unwrap();
        assert_eq!(payload, b"42");
    }

    #[tokio::test]
    async fn test_http_put_sends_body_with_content_type() {
        let router = Router::new().route(
            "/value",
            axum::routing::put(|headers: axum::http::HeaderMap, body: String| async move {
                let ct = headers
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                format!("{}|{}", ct, body)
            }),
        );
        let addr = serve(router).await;
        let client = ThingClient::new().unwrap();

        let payload = client
            .send(
                &descriptor(format!("http://{}/value", addr), Verb::Write),
                Some(b"7"),
            )
            .await
            .unwrap();
        assert_eq!(payload, b"application/json|7");
    }

    #[tokio::test]
    async fn test_http_error_status_is_unreachable() {
        let router = Router::new().route(
            "/value",
            post(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let addr = serve(router).await;
        let client = ThingClient::new().unwrap();

        // GET on a POST-only route → 405
        let err = client
            .send(&descriptor(format!("http://{}/value", addr), Verb::Read), None)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ThingUnreachable { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_http_other_success_codes_are_unreachable() {
        let router = Router::new()
            .route(
                "/accepted",
                get(|| async { (axum::http::StatusCode::ACCEPTED, "42") }),
            )
            .route(
                "/created",
                get(|| async { (axum::http::StatusCode::CREATED, "42") }),
            );
        let addr = serve(router).await;
        let client = ThingClient::new().unwrap();

        for path in ["accepted", "created"] {
            let err = client
                .send(&descriptor(format!("http://{}/{}", addr, path), Verb::Read), None)
                .await
                .unwrap_err();
            match err {
                GatewayError::ThingUnreachable { message, .. } => {
                    assert!(message.contains("status"), "{}", message);
                }
                other => panic!("unexpected error: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_http_no_content_is_success() {
        let router = Router::new().route(
            "/value",
            axum::routing::put(|| async { axum::http::StatusCode::NO_CONTENT }),
        );
        let addr = serve(router).await;
        let client = ThingClient::new().unwrap();

        let payload = client
            .send(
                &descriptor(format!("http://{}/value", addr), Verb::Write),
                Some(b"7"),
            )
            .await
            .unwrap();
        assert!(payload.is_empty());
    }

    #[tokio::test]
    async fn test_http_timeout_is_unreachable() {
        let router = Router::new().route(
            "/value",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
        let addr = serve(router).await;
        let client = ThingClient::with_timeout(Duration::from_millis(100)).unwrap();

        let err = client
            .send(&descriptor(format!("http://{}/value", addr), Verb::Read), None)
            .await
            .unwrap_err();
        match err {
            GatewayError::ThingUnreachable { thing, message } => {
                assert_eq!(thing, "Probe");
                assert!(message.contains("timed out"), "{}", message);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
