//! Gateway proxy handlers
//!
//! `/gateway/{uri}` forwards a consumer request to the registered route.
//! GET takes its parameters from the query string, POST and PUT from a JSON
//! object body. The `id` key selects one Thing of an aggregated route; on
//! GET, `min_*` and `max_*` keys are range filters.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use wotgate_gateway::{
    AccessResult, FlatRecord, Method, RangeFilters, ID_FIELD, MAX_FILTER_PREFIX, MIN_FILTER_PREFIX,
};

use crate::error::ApiError;
use crate::state::AppState;

/// Header listing the ids of Things that failed during a fan-out
pub const FAILED_THINGS_HEADER: &str = "x-wotgate-failed-things";

/// GET /gateway/{uri}
pub async fn get_gateway(
    State(state): State<AppState>,
    Path(uri): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let mut params: FlatRecord = query
        .into_iter()
        .map(|(key, raw)| (key, parse_query_value(raw)))
        .collect();

    let id = take_id(&mut params)?;
    let filters = take_filters(&mut params)?;

    let result = state
        .registry()
        .dispatch(&uri, Method::Get, &params, id, filters.as_ref())
        .await?;
    Ok(records_response(result))
}

/// POST /gateway/{uri}
pub async fn post_gateway(
    State(state): State<AppState>,
    Path(uri): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    dispatch_with_body(&state, &uri, Method::Post, &body).await
}

/// PUT /gateway/{uri}
pub async fn put_gateway(
    State(state): State<AppState>,
    Path(uri): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    dispatch_with_body(&state, &uri, Method::Put, &body).await
}

async fn dispatch_with_body(
    state: &AppState,
    uri: &str,
    method: Method,
    body: &[u8],
) -> Result<Response, ApiError> {
    let mut params = parse_body(body)?;
    let id = take_id(&mut params)?;

    let result = state
        .registry()
        .dispatch(uri, method, &params, id, None)
        .await?;
    Ok(records_response(result))
}

fn records_response(result: AccessResult) -> Response {
    let failed: Vec<String> = result.failures.iter().map(|f| f.id.to_string()).collect();
    let mut response = Json(result.records).into_response();

    if !failed.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&failed.join(",")) {
            response
                .headers_mut()
                .insert(HeaderName::from_static(FAILED_THINGS_HEADER), value);
        }
    }
    response
}

/// Query values are JSON when they parse as JSON, plain strings otherwise
fn parse_query_value(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

fn parse_body(body: &[u8]) -> Result<FlatRecord, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(FlatRecord::new());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(params)) => Ok(params),
        Ok(_) => Err(ApiError::BadRequest(
            "Request body must be a JSON object".to_string(),
        )),
        Err(e) => Err(ApiError::BadRequest(format!("Invalid JSON body: {}", e))),
    }
}

/// Remove the `id` key from `params` and interpret it as a Thing id
fn take_id(params: &mut FlatRecord) -> Result<Option<i64>, ApiError> {
    let Some(raw) = params.remove(ID_FIELD) else {
        return Ok(None);
    };

    let id = match &raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };

    id.map(Some)
        .ok_or_else(|| ApiError::BadRequest(format!("id must be an integer, got {}", raw)))
}

/// Remove `min_*` / `max_*` keys from `params` as range filters
fn take_filters(params: &mut FlatRecord) -> Result<Option<RangeFilters>, ApiError> {
    let keys: Vec<String> = params
        .keys()
        .filter(|key| key.starts_with(MIN_FILTER_PREFIX) || key.starts_with(MAX_FILTER_PREFIX))
        .cloned()
        .collect();

    if keys.is_empty() {
        return Ok(None);
    }

    let mut filters = RangeFilters::new();
    for key in keys {
        let value = params.remove(&key).unwrap_or(Value::Null);
        let bound = value.as_f64().ok_or_else(|| {
            ApiError::BadRequest(format!("Filter '{}' must be numeric, got {}", key, value))
        })?;
        filters.insert(key, bound);
    }
    Ok(Some(filters))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> FlatRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_query_values_parsed_as_json() {
        assert_eq!(parse_query_value("42".into()), json!(42));
        assert_eq!(parse_query_value("true".into()), json!(true));
        assert_eq!(parse_query_value("living room".into()), json!("living room"));
    }

    #[test]
    fn test_take_id() {
        let mut params = record(json!({"id": 2, "level": 5}));
        assert_eq!(take_id(&mut params).unwrap(), Some(2));
        assert_eq!(params, record(json!({"level": 5})));

        let mut params = record(json!({"id": "1"}));
        assert_eq!(take_id(&mut params).unwrap(), Some(1));

        let mut params = record(json!({"id": "first"}));
        assert!(matches!(take_id(&mut params), Err(ApiError::BadRequest(_))));

        assert_eq!(take_id(&mut FlatRecord::new()).unwrap(), None);
    }

    #[test]
    fn test_take_filters() {
        let mut params = record(json!({"min_temp": 15, "max_temp": 25.5, "unit": "C"}));
        let filters = take_filters(&mut params).unwrap().unwrap();
        assert_eq!(filters.get("min_temp"), Some(&15.0));
        assert_eq!(filters.get("max_temp"), Some(&25.5));
        assert_eq!(params, record(json!({"unit": "C"})));

        let mut params = record(json!({"min_temp": "warm"}));
        assert!(take_filters(&mut params).is_err());
    }

    #[test]
    fn test_body_must_be_object() {
        assert!(parse_body(b"").unwrap().is_empty());
        assert!(parse_body(b"[1, 2]").is_err());
        assert!(parse_body(b"{nope").is_err());
        assert_eq!(
            parse_body(br#"{"level": 3}"#).unwrap(),
            record(json!({"level": 3}))
        );
    }
}
