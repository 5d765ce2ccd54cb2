//! Protocol binding models

use serde::{Deserialize, Serialize};
use wotgate_conv::one_or_many;

/// A Thing's protocol binding for one interaction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Form {
    /// Target URL, absolute or relative to the Thing's `base`
    pub href: String,
    /// Operation tags (`readproperty`, `invokeaction`, ...); older TDs call this `rel`
    #[serde(
        default,
        alias = "rel",
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub op: Vec<String>,
    /// HTTP method hint
    #[serde(
        rename = "htv:methodName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub http_method: Option<String>,
    /// CoAP method hint, by name (`GET`) or code (`0.01`)
    #[serde(
        rename = "cov:methodName",
        alias = "cov:methodCode",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub coap_method: Option<String>,
    #[serde(
        rename = "contentType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub content_type: Option<String>,
}

impl Form {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            ..Self::default()
        }
    }

    /// Add an operation tag
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op.push(op.into());
        self
    }

    pub fn with_http_method(mut self, method: impl Into<String>) -> Self {
        self.http_method = Some(method.into());
        self
    }

    pub fn with_coap_method(mut self, method: impl Into<String>) -> Self {
        self.coap_method = Some(method.into());
        self
    }

    /// Whether the form carries any operation tag
    pub fn is_tagged(&self) -> bool {
        !self.op.is_empty()
    }

    /// Whether one of the form's tags names `verb`
    pub fn supports(&self, verb: Verb) -> bool {
        self.op.iter().any(|op| verb.matches(op))
    }
}

/// What a gateway request does with an interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Read,
    Write,
    Invoke,
}

impl Verb {
    /// TD operation name for this verb
    pub fn op_name(&self) -> &'static str {
        match self {
            Verb::Read => "readproperty",
            Verb::Write => "writeproperty",
            Verb::Invoke => "invokeaction",
        }
    }

    /// Case-insensitive match against a form's operation tag
    pub fn matches(&self, op: &str) -> bool {
        op.eq_ignore_ascii_case(self.op_name())
    }

    /// Method used when the form gives no usable hint
    pub fn default_method(&self) -> Method {
        match self {
            Verb::Read => Method::Get,
            Verb::Write => Method::Put,
            Verb::Invoke => Method::Post,
        }
    }
}

/// Wire protocol toward a Thing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Coap,
}

impl Protocol {
    /// Infer the protocol from a URL scheme
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "http" | "https" => Some(Protocol::Http),
            "coap" | "coaps" => Some(Protocol::Coap),
            _ => None,
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Protocol::Http => "http",
            Protocol::Coap => "coap",
        })
    }
}

/// Request method, shared by HTTP and CoAP
///
/// Parses from names or CoAP method codes:
///
/// ```
/// # use wotgate_core::Method;
/// assert_eq!("post".parse::<Method>().unwrap(), Method::Post);
/// assert_eq!("0.03".parse::<Method>().unwrap(), Method::Put);
/// assert!("DELETE".parse::<Method>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        })
    }
}

impl std::str::FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" | "0.01" => Ok(Method::Get),
            "POST" | "0.02" => Ok(Method::Post),
            "PUT" | "0.03" => Ok(Method::Put),
            other => Err(format!("Unsupported method: '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_form_accepts_rel_alias() {
        let form: Form =
            serde_json::from_value(json!({"href": "http://lamp/on", "rel": "invokeAction"}))
                .unwrap();
        assert!(form.supports(Verb::Invoke));
        assert!(!form.supports(Verb::Read));
    }

    #[test]
    fn test_form_op_list_and_hints() {
        let form: Form = serde_json::from_value(json!({
            "href": "coap://lamp/level",
            "op": ["readproperty", "writeproperty"],
            "cov:methodName": "PUT",
            "contentType": "application/cbor"
        }))
        .unwrap();
        assert!(form.supports(Verb::Read));
        assert!(form.supports(Verb::Write));
        assert_eq!(form.coap_method.as_deref(), Some("PUT"));
        assert_eq!(form.content_type.as_deref(), Some("application/cbor"));
    }

    #[test]
    fn test_untagged_form() {
        let form: Form = serde_json::from_value(json!({"href": "/status"})).unwrap();
        assert!(!form.is_tagged());
    }

    #[test]
    fn test_default_methods() {
        assert_eq!(Verb::Read.default_method(), Method::Get);
        assert_eq!(Verb::Write.default_method(), Method::Put);
        assert_eq!(Verb::Invoke.default_method(), Method::Post);
    }

    #[test]
    fn test_protocol_from_scheme() {
        assert_eq!(Protocol::from_scheme("https"), Some(Protocol::Http));
        assert_eq!(Protocol::from_scheme("COAP"), Some(Protocol::Coap));
        assert_eq!(Protocol::from_scheme("mqtt"), None);
    }

    #[test]
    fn test_method_serde_uppercase() {
        assert_eq!(serde_json::to_value(Method::Post).unwrap(), json!("POST"));
        assert_eq!(
            serde_json::from_value::<Method>(json!("PUT")).unwrap(),
            Method::Put
        );
    }
}
