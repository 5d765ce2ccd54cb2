//! ThingRequester - one interaction request against one Thing
//!
//! Converts the flat Offering-side input into the nested shape the Thing
//! expects, sends it through a [`ThingTransport`], and converts the Thing's
//! nested answer back into a flat record.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};
use wotgate_core::{
    FlatRecord, GatewayError, GatewayResult, InteractionDescriptor, Method, SchemaTranslator,
    ThingTransport,
};

/// Performs requests for one resolved interaction
#[derive(Clone)]
pub struct ThingRequester {
    descriptor: InteractionDescriptor,
    transport: Arc<dyn ThingTransport>,
    translator: SchemaTranslator,
}

impl std::fmt::Debug for ThingRequester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThingRequester")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

impl ThingRequester {
    pub fn new(
        descriptor: InteractionDescriptor,
        transport: Arc<dyn ThingTransport>,
        translator: SchemaTranslator,
    ) -> Self {
        Self {
            descriptor,
            transport,
            translator,
        }
    }

    pub fn descriptor(&self) -> &InteractionDescriptor {
        &self.descriptor
    }

    /// Send `input` to the Thing and return its answer as a flat record.
    ///
    /// Transport failures surface as `ThingUnreachable`. A body that is not
    /// JSON is logged and treated as an empty answer.
    pub async fn make_request(&self, input: &FlatRecord) -> GatewayResult<FlatRecord> {
        let body = self.encode_body(input);
        debug!(
            thing = %self.descriptor.thing,
            interaction = %self.descriptor.interaction,
            method = %self.descriptor.method,
            url = %self.descriptor.url,
            has_body = body.is_some(),
            "Requesting Thing"
        );

        let payload = self.transport.send(&self.descriptor, body.as_deref()).await?;

        let value = match self.decode_payload(&payload) {
            Ok(Some(value)) => value,
            Ok(None) => return Ok(FlatRecord::new()),
            Err(e) => {
                warn!(error = %e, "Degrading malformed Thing response to an empty record");
                return Ok(FlatRecord::new());
            }
        };

        Ok(match &self.descriptor.output_schema {
            Some(schema) => {
                self.translator
                    .from_nested(schema, &value, &self.descriptor.interaction)
            }
            None => FlatRecord::new(),
        })
    }

    /// Request body for `input`; GET and schema-less requests carry none.
    ///
    /// Strings are sent raw, every other value as JSON text.
    fn encode_body(&self, input: &FlatRecord) -> Option<Vec<u8>> {
        if self.descriptor.method == Method::Get {
            return None;
        }

        let schema = self.descriptor.input_schema.as_ref()?;
        let nested = self
            .translator
            .to_nested(schema, input, &self.descriptor.interaction)?;

        Some(match nested {
            Value::String(raw) => raw.into_bytes(),
            other => other.to_string().into_bytes(),
        })
    }

    /// Parse a Thing payload; `Ok(None)` means there is nothing to translate
    fn decode_payload(&self, payload: &[u8]) -> GatewayResult<Option<Value>> {
        if payload.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        match serde_json::from_slice::<Value>(payload) {
            Ok(Value::Object(map)) if map.is_empty() => Ok(None),
            Ok(value) => Ok(Some(value)),
            Err(e) => Err(GatewayError::MalformedResponse {
                thing: self.descriptor.thing.clone(),
                message: e.to_string(),
            }),
        }
    }
}
