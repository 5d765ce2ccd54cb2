//! ThingTransport trait - the wire seam between the gateway and Things

use async_trait::async_trait;

use crate::error::GatewayResult;
use crate::forms::InteractionDescriptor;

/// Sends one request to a Thing and returns the raw response payload.
///
/// Implementations map every transport failure, non-success status and
/// timeout to `GatewayError::ThingUnreachable`. Payload interpretation
/// (JSON parsing, schema translation) is left to the caller.
#[async_trait]
pub trait ThingTransport: Send + Sync {
    async fn send(
        &self,
        descriptor: &InteractionDescriptor,
        body: Option<&[u8]>,
    ) -> GatewayResult<Vec<u8>>;
}
