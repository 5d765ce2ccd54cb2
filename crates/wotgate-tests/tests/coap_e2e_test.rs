//! End-to-end tests: CoAP Things behind gateway routes

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wotgate_api::{create_router, AppState};
use wotgate_client::ThingClient;
use wotgate_core::{SchemaTranslator, Thing};
use wotgate_gateway::{GatewayRoute, GatewayRouteRegistry, RouteRequest};
use wotgate_tests::{GatewayServer, MockCoapThing};

async fn start_meters(count: usize) -> Vec<MockCoapThing> {
    let mut meters = Vec::with_capacity(count);
    for n in 0..count {
        let meter = MockCoapThing::start().await.unwrap();
        meter.state.set("power", json!(100 * (n + 1)));
        meter.state.set("limit", json!(500));
        meters.push(meter);
    }
    meters
}

async fn gateway_for(meters: &[MockCoapThing], requests: Vec<RouteRequest>) -> GatewayServer {
    let descriptions: Vec<Thing> = meters
        .iter()
        .enumerate()
        .map(|(n, m)| m.meter_description(&format!("Meter {}", n)))
        .collect();

    let transport = Arc::new(ThingClient::with_timeout(Duration::from_secs(2)).unwrap());
    let translator = SchemaTranslator::default();
    let mut registry = GatewayRouteRegistry::new();
    for request in requests {
        registry
            .add_route(GatewayRoute::build(
                &descriptions,
                request,
                transport.clone(),
                &translator,
            ))
            .unwrap();
    }

    let gateway = GatewayServer::start(create_router(AppState::with_local_catalog(registry)))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    gateway
}

#[tokio::test]
async fn test_coap_read_fan_out() {
    let meters = start_meters(2).await;
    let gateway = gateway_for(&meters, vec![RouteRequest::read(["power"])]).await;

    let response = gateway
        .http
        .get(gateway.route_url("Meter0-Read-power"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!([
            {"power": 100, "id": 0},
            {"power": 200, "id": 1}
        ])
    );
}

#[tokio::test]
async fn test_coap_write_uses_put_hint() {
    let meters = start_meters(2).await;
    let gateway = gateway_for(
        &meters,
        vec![RouteRequest::write("limit"), RouteRequest::read(["limit"])],
    )
    .await;

    let response = gateway
        .http
        .post(gateway.route_url("Meter0-Write-limit"))
        .json(&json!({"limit": 750, "id": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(meters[1].state.get("limit"), Some(json!(750)));
    assert_eq!(meters[0].state.get("limit"), Some(json!(500)));

    let body: Value = gateway
        .http
        .get(format!("{}?id=1", gateway.route_url("Meter0-Read-limit")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!([{"limit": 750, "id": 1}]));
}

#[tokio::test]
async fn test_coap_error_code_is_upstream_failure() {
    let meter = MockCoapThing::start().await.unwrap();
    // Nothing stored under "power": the Thing answers 4.04
    let gateway = gateway_for(
        std::slice::from_ref(&meter),
        vec![RouteRequest::read(["power"])],
    )
    .await;

    let response = gateway
        .http
        .get(gateway.route_url("Meter0-Read-power"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 502);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "bad_gateway");
}
