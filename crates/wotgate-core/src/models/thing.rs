//! Thing Description models

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use wotgate_conv::{DataSchema, JsonLdContext};

use super::form::Form;

/// A parsed WoT Thing Description (the subset the gateway uses)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Thing {
    /// JSON-LD context used to expand semantic annotations
    #[serde(rename = "@context", default)]
    pub context: JsonLdContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Human-readable name, also the basis for route URIs
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Base URL for relative form hrefs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyAffordance>,
    #[serde(default)]
    pub actions: BTreeMap<String, ActionAffordance>,
}

impl Thing {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, property: PropertyAffordance) -> Self {
        self.properties.insert(name.into(), property);
        self
    }

    pub fn with_action(mut self, name: impl Into<String>, action: ActionAffordance) -> Self {
        self.actions.insert(name.into(), action);
        self
    }

    pub fn property(&self, name: &str) -> Option<&PropertyAffordance> {
        self.properties.get(name)
    }

    pub fn action(&self, name: &str) -> Option<&ActionAffordance> {
        self.actions.get(name)
    }
}

/// A Thing property: a data schema plus its forms
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyAffordance {
    #[serde(flatten)]
    pub schema: DataSchema,
    #[serde(default)]
    pub forms: Vec<Form>,
    #[serde(rename = "readOnly", default)]
    pub read_only: bool,
    #[serde(rename = "writeOnly", default)]
    pub write_only: bool,
    #[serde(default)]
    pub observable: bool,
}

impl PropertyAffordance {
    pub fn new(schema: DataSchema, forms: Vec<Form>) -> Self {
        Self {
            schema,
            forms,
            ..Self::default()
        }
    }
}

/// A Thing action with optional input and output schemas
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionAffordance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<DataSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<DataSchema>,
    #[serde(default)]
    pub forms: Vec<Form>,
    #[serde(default)]
    pub safe: bool,
    #[serde(default)]
    pub idempotent: bool,
}

impl ActionAffordance {
    pub fn new(input: Option<DataSchema>, output: Option<DataSchema>, forms: Vec<Form>) -> Self {
        Self {
            input,
            output,
            forms,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_thing_description() {
        let thing: Thing = serde_json::from_value(json!({
            "@context": ["https://www.w3.org/2019/wot/td/v1", {"saref": "https://w3id.org/saref#"}],
            "title": "Lamp",
            "base": "http://lamp.local:8080/",
            "properties": {
                "brightness": {
                    "@type": "saref:LightingDevice",
                    "type": "integer",
                    "readOnly": true,
                    "forms": [{"href": "properties/brightness"}]
                }
            },
            "actions": {
                "fade": {
                    "input": {"type": "object", "properties": {"to": {"type": "integer"}}},
                    "forms": [{"href": "actions/fade", "op": "invokeaction"}]
                }
            },
            "events": {"overheat": {"forms": [{"href": "events/overheat"}]}}
        }))
        .unwrap();

        let brightness = thing.property("brightness").unwrap();
        assert!(brightness.read_only);
        assert_eq!(brightness.schema.data_type.as_deref(), Some("integer"));
        assert_eq!(brightness.schema.semantic_type, vec!["saref:LightingDevice"]);
        assert_eq!(brightness.forms.len(), 1);

        let fade = thing.action("fade").unwrap();
        assert!(fade.input.as_ref().unwrap().is_object());
        assert!(fade.output.is_none());

        assert_eq!(
            thing.context.resolve_prefix("saref"),
            Some("https://w3id.org/saref#")
        );
    }
}
