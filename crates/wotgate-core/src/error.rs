//! Common error types for the gateway engine

use thiserror::Error;

use crate::models::Method;

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Who is responsible for an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller sent something unusable (missing or bad id, bad params)
    CallerInput,
    /// The route or registry is misconfigured; retrying will not help
    Configuration,
    /// A backing Thing or the marketplace failed; may succeed on retry
    Upstream,
}

/// Errors that can occur while building, registering or accessing routes
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Route was marked invalid at construction time
    #[error("Route is invalid: {0}")]
    RouteInvalid(String),

    /// No form of the interaction fits the requested verb or protocol
    #[error("No compatible form for '{interaction}' on Thing '{thing}'")]
    NoCompatibleForm { thing: String, interaction: String },

    /// Thing does not declare the requested property or action
    #[error("Interaction '{interaction}' not found on Thing '{thing}'")]
    InteractionNotFound { thing: String, interaction: String },

    /// Route URI already registered
    #[error("Route URI already registered: {0}")]
    DuplicateUri(String),

    /// Aggregated write/action route called without an id
    #[error("Route '{0}' targets several Things and requires an id")]
    IdRequired(String),

    /// Id does not address a backing Thing
    #[error("Invalid id {id}: route has {count} Things")]
    InvalidId { id: i64, count: usize },

    /// Request to a backing Thing failed or timed out
    #[error("Thing '{thing}' unreachable: {message}")]
    ThingUnreachable { thing: String, message: String },

    /// Thing answered with a body that is not JSON
    #[error("Malformed response from Thing '{thing}': {message}")]
    MalformedResponse { thing: String, message: String },

    /// No route registered under this URI
    #[error("Route not found: {0}")]
    RouteNotFound(String),

    /// Route exists but is served with a different method
    #[error("Method {actual} not allowed on '{uri}' (expected {expected})")]
    MethodMismatch {
        uri: String,
        expected: Method,
        actual: Method,
    },

    /// Marketplace rejected or failed a catalog operation
    #[error("Marketplace error: {0}")]
    Marketplace(String),
}

impl GatewayError {
    /// Classify the error by responsibility
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::IdRequired(_) | GatewayError::InvalidId { .. } => ErrorKind::CallerInput,
            GatewayError::RouteInvalid(_)
            | GatewayError::NoCompatibleForm { .. }
            | GatewayError::InteractionNotFound { .. }
            | GatewayError::DuplicateUri(_)
            | GatewayError::RouteNotFound(_)
            | GatewayError::MethodMismatch { .. } => ErrorKind::Configuration,
            GatewayError::ThingUnreachable { .. }
            | GatewayError::MalformedResponse { .. }
            | GatewayError::Marketplace(_) => ErrorKind::Upstream,
        }
    }

    /// Whether a caller-driven retry may succeed
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Upstream
    }

    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::RouteInvalid(_) => 409,
            GatewayError::NoCompatibleForm { .. } => 422,
            GatewayError::InteractionNotFound { .. } => 404,
            GatewayError::DuplicateUri(_) => 409,
            GatewayError::IdRequired(_) => 400,
            GatewayError::InvalidId { .. } => 400,
            GatewayError::ThingUnreachable { .. } => 502,
            GatewayError::MalformedResponse { .. } => 502,
            GatewayError::RouteNotFound(_) => 404,
            GatewayError::MethodMismatch { .. } => 405,
            GatewayError::Marketplace(_) => 502,
        }
    }
}
