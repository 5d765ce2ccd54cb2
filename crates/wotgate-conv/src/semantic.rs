//! Semantic URI resolution

use crate::schema::JsonLdContext;

/// Fallback URI for data types without a known semantic mapping
pub const DEFAULT_FALLBACK_URI: &str = "http://schema.org/Thing";

/// Default semantic URI for a primitive JSON Schema type
pub fn primitive_uri(data_type: &str) -> Option<&'static str> {
    match data_type {
        "string" => Some("http://schema.org/Text"),
        "boolean" => Some("http://schema.org/Boolean"),
        "number" => Some("http://schema.org/Number"),
        "integer" => Some("http://schema.org/Integer"),
        "float" => Some("http://schema.org/Float"),
        _ => None,
    }
}

/// Expand a compact `prefix:local` identifier against a JSON-LD context.
///
/// Identifiers whose prefix is not defined in the context are returned
/// unchanged, which also covers absolute IRIs such as `http://...`.
///
/// ```
/// # use wotgate_conv::{replace_prefix, JsonLdContext};
/// let context = JsonLdContext::new(vec![serde_json::json!({"s": "http://schema.org/"})]);
/// assert_eq!(replace_prefix("s:Text", &context), "http://schema.org/Text");
/// assert_eq!(replace_prefix("x:Text", &context), "x:Text");
/// ```
pub fn replace_prefix(identifier: &str, context: &JsonLdContext) -> String {
    let Some((prefix, local)) = identifier.split_once(':') else {
        return identifier.to_string();
    };

    match context.resolve_prefix(prefix) {
        Some(base) if base.ends_with('/') || base.ends_with('#') => format!("{}{}", base, local),
        Some(base) => format!("{}#{}", base, local),
        None => identifier.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> JsonLdContext {
        JsonLdContext::new(vec![
            json!("https://www.w3.org/2019/wot/td/v1"),
            json!({"schema": "http://schema.org/", "om": "http://www.ontology-of-units-of-measure.org/resource/om-2"}),
        ])
    }

    #[test]
    fn test_slash_terminated_base() {
        assert_eq!(
            replace_prefix("schema:Temperature", &context()),
            "http://schema.org/Temperature"
        );
    }

    #[test]
    fn test_hash_inserted_for_other_bases() {
        assert_eq!(
            replace_prefix("om:degreeCelsius", &context()),
            "http://www.ontology-of-units-of-measure.org/resource/om-2#degreeCelsius"
        );
    }

    #[test]
    fn test_unresolvable_passes_through() {
        assert_eq!(replace_prefix("saref:Light", &context()), "saref:Light");
        assert_eq!(replace_prefix("Light", &context()), "Light");
        assert_eq!(
            replace_prefix("http://example.org/Light", &context()),
            "http://example.org/Light"
        );
    }

    #[test]
    fn test_primitive_table() {
        assert_eq!(primitive_uri("string"), Some("http://schema.org/Text"));
        assert_eq!(primitive_uri("integer"), Some("http://schema.org/Integer"));
        assert_eq!(primitive_uri("array"), None);
    }
}
