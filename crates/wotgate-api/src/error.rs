//! API error types and conversions

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use wotgate_core::GatewayError;

/// API error type that converts to HTTP responses
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request
    BadRequest(String),
    /// 404 Not Found
    NotFound(String),
    /// 405 Method Not Allowed
    MethodNotAllowed(String),
    /// 409 Conflict
    Conflict(String),
    /// 422 Unprocessable Entity
    Unprocessable(String),
    /// 502 Bad Gateway (Thing or marketplace failed)
    BadGateway(String),
    /// 500 Internal Server Error
    Internal(String),
}

/// Standard error response format
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::MethodNotAllowed(msg) => {
                (StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed", msg)
            }
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::Unprocessable(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "unprocessable_entity", msg)
            }
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "bad_gateway", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        // Log errors at appropriate levels
        if status.is_server_error() {
            tracing::error!(error = error_type, %message, "API error");
        } else if status.is_client_error() {
            tracing::debug!(error = error_type, %message, "API client error");
        }

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        let message = err.to_string();
        match err {
            GatewayError::IdRequired(_) | GatewayError::InvalidId { .. } => {
                ApiError::BadRequest(message)
            }
            GatewayError::RouteNotFound(_) | GatewayError::InteractionNotFound { .. } => {
                ApiError::NotFound(message)
            }
            GatewayError::MethodMismatch { .. } => ApiError::MethodNotAllowed(message),
            GatewayError::RouteInvalid(_) | GatewayError::DuplicateUri(_) => {
                ApiError::Conflict(message)
            }
            GatewayError::NoCompatibleForm { .. } => ApiError::Unprocessable(message),
            GatewayError::ThingUnreachable { .. }
            | GatewayError::MalformedResponse { .. }
            | GatewayError::Marketplace(_) => ApiError::BadGateway(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wotgate_core::Method;

    fn status_of(err: GatewayError) -> u16 {
        let expected = err.status_code();
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status().as_u16(), expected);
        expected
    }

    #[test]
    fn test_status_matches_gateway_error() {
        assert_eq!(status_of(GatewayError::IdRequired("r".into())), 400);
        assert_eq!(status_of(GatewayError::RouteNotFound("r".into())), 404);
        assert_eq!(
            status_of(GatewayError::MethodMismatch {
                uri: "r".into(),
                expected: Method::Get,
                actual: Method::Put,
            }),
            405
        );
        assert_eq!(status_of(GatewayError::RouteInvalid("r".into())), 409);
        assert_eq!(
            status_of(GatewayError::NoCompatibleForm {
                thing: "t".into(),
                interaction: "i".into(),
            }),
            422
        );
        assert_eq!(
            status_of(GatewayError::ThingUnreachable {
                thing: "t".into(),
                message: "down".into(),
            }),
            502
        );
    }
}
