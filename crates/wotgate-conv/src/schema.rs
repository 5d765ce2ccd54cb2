//! Schema types shared by the Thing and Offering models
//!
//! `DataSchema` is the subset of the WoT data schema vocabulary the
//! translator understands. Property order is preserved as written in the
//! Thing Description because flattened fields are matched positionally.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A (possibly nested) Thing data schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSchema {
    /// Semantic annotation (`@type`); a non-empty annotation makes the node opaque
    #[serde(
        rename = "@type",
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub semantic_type: Vec<String>,
    /// JSON Schema type name (`object`, `string`, `number`, ...)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    /// Object members, in declaration order
    #[serde(
        default,
        with = "ordered_properties",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub properties: Vec<(String, DataSchema)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl DataSchema {
    /// Create a schema node for a primitive type name
    pub fn primitive(data_type: impl Into<String>) -> Self {
        Self {
            data_type: Some(data_type.into()),
            ..Self::default()
        }
    }

    /// Create an object schema from `(name, schema)` pairs
    pub fn object<I, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = (S, DataSchema)>,
        S: Into<String>,
    {
        Self {
            data_type: Some("object".to_string()),
            properties: properties
                .into_iter()
                .map(|(name, schema)| (name.into(), schema))
                .collect(),
            ..Self::default()
        }
    }

    /// Add a semantic annotation
    pub fn with_semantic_type(mut self, semantic_type: impl Into<String>) -> Self {
        self.semantic_type.push(semantic_type.into());
        self
    }

    /// Whether this node carries a semantic annotation
    pub fn is_annotated(&self) -> bool {
        !self.semantic_type.is_empty()
    }

    /// Whether this node is an object schema
    pub fn is_object(&self) -> bool {
        self.data_type.as_deref() == Some("object")
    }

    /// Look up a direct member schema by name
    pub fn property(&self, name: &str) -> Option<&DataSchema> {
        self.properties
            .iter()
            .find(|(prop, _)| prop == name)
            .map(|(_, schema)| schema)
    }
}

/// One flattened leaf of a schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataField {
    /// Compound field name (`root_member_leaf`)
    pub name: String,
    /// Semantic type URI of the leaf
    pub rdf_uri: String,
}

impl DataField {
    pub fn new(name: impl Into<String>, rdf_uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rdf_uri: rdf_uri.into(),
        }
    }
}

/// JSON-LD `@context` of a Thing Description
///
/// Stored as the ordered list of context entries. Only object entries
/// contribute prefix mappings; plain IRIs are kept but never match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonLdContext(Vec<Value>);

impl JsonLdContext {
    pub fn new(entries: Vec<Value>) -> Self {
        Self(entries)
    }

    /// Context entries in declaration order
    pub fn entries(&self) -> &[Value] {
        &self.0
    }

    /// Resolve a prefix to its base IRI. The first entry defining it wins.
    pub fn resolve_prefix(&self, prefix: &str) -> Option<&str> {
        self.0.iter().find_map(|entry| {
            let definition = entry.as_object()?.get(prefix)?;
            match definition {
                Value::String(iri) => Some(iri.as_str()),
                // Expanded term definition: {"@id": "..."}
                Value::Object(term) => term.get("@id").and_then(Value::as_str),
                _ => None,
            }
        })
    }
}

impl<'de> Deserialize<'de> for JsonLdContext {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(entries) => Self(entries),
            Value::Null => Self::default(),
            single => Self(vec![single]),
        })
    }
}

impl Serialize for JsonLdContext {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

/// Accept either a single string or a list of strings
pub fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
        None => Vec::new(),
    })
}

/// (De)serialize object members as a JSON map while keeping declaration order
mod ordered_properties {
    use super::*;

    pub fn serialize<S: Serializer>(
        properties: &[(String, DataSchema)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(properties.len()))?;
        for (name, schema) in properties {
            map.serialize_entry(name, schema)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(String, DataSchema)>, D::Error> {
        struct PropertiesVisitor;

        impl<'de> Visitor<'de> for PropertiesVisitor {
            type Value = Vec<(String, DataSchema)>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of property schemas")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut properties = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, schema)) = access.next_entry::<String, DataSchema>()? {
                    properties.push((name, schema));
                }
                Ok(properties)
            }
        }

        deserializer.deserialize_map(PropertiesVisitor)
    }
}
