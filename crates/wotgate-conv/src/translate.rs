//! Nested schema ⇄ flat field translation
//!
//! A Thing interaction's data schema is flattened into an ordered list of
//! leaf fields named `root_member_leaf`. Values travel the same way: a flat
//! record keyed by compound names is folded back into the nested shape the
//! Thing expects, and the Thing's nested answer is unfolded into a flat
//! record.
//!
//! Property names that themselves contain the separator make the compound
//! names ambiguous. That case is not escaped; the first schema member that
//! claims a flat key consumes it.

use serde_json::{Map, Value};
use tracing::warn;

use crate::schema::{DataField, DataSchema, JsonLdContext};
use crate::semantic::{primitive_uri, replace_prefix, DEFAULT_FALLBACK_URI};

/// Separator between levels of a compound field name
pub const FIELD_SEPARATOR: &str = "_";

/// Flat Offering-side record: compound field name → value
pub type FlatRecord = Map<String, Value>;

/// Build the compound name of a member below `parent`
pub fn compound_name(parent: &str, member: &str) -> String {
    format!("{}{}{}", parent, FIELD_SEPARATOR, member)
}

/// Translates between nested Thing schemas and flat Offering fields
#[derive(Debug, Clone)]
pub struct SchemaTranslator {
    fallback_uri: String,
}

impl Default for SchemaTranslator {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_URI)
    }
}

impl SchemaTranslator {
    /// Create a translator that maps unknown primitive types to `fallback_uri`
    pub fn new(fallback_uri: impl Into<String>) -> Self {
        Self {
            fallback_uri: fallback_uri.into(),
        }
    }

    pub fn fallback_uri(&self) -> &str {
        &self.fallback_uri
    }

    /// Flatten `schema` into leaf fields rooted at `root`.
    ///
    /// Annotated nodes are opaque leaves even when they are objects.
    pub fn flatten(
        &self,
        schema: &DataSchema,
        root: &str,
        context: &JsonLdContext,
    ) -> Vec<DataField> {
        let mut fields = Vec::new();
        self.flatten_into(schema, root, context, &mut fields);
        fields
    }

    fn flatten_into(
        &self,
        schema: &DataSchema,
        name: &str,
        context: &JsonLdContext,
        fields: &mut Vec<DataField>,
    ) {
        if let Some(annotation) = schema.semantic_type.first() {
            fields.push(DataField::new(name, replace_prefix(annotation, context)));
            return;
        }

        if schema.is_object() {
            for (member, child) in &schema.properties {
                self.flatten_into(child, &compound_name(name, member), context, fields);
            }
            return;
        }

        let rdf_uri = match schema.data_type.as_deref().and_then(primitive_uri) {
            Some(uri) => uri.to_string(),
            None => {
                warn!(
                    field = %name,
                    data_type = ?schema.data_type,
                    fallback = %self.fallback_uri,
                    "No semantic type for data type, using fallback URI"
                );
                self.fallback_uri.clone()
            }
        };
        fields.push(DataField::new(name, rdf_uri));
    }

    /// Fold a flat record into the nested value described by `schema`.
    ///
    /// Returns `None` when the record holds nothing for this schema. The
    /// input record is left untouched; matching works on a copy whose keys
    /// are consumed as they are claimed.
    pub fn to_nested(&self, schema: &DataSchema, flat: &FlatRecord, root: &str) -> Option<Value> {
        let mut remaining = flat.clone();
        take_nested(schema, root, &mut remaining)
    }

    /// Unfold a nested value into a flat record rooted at `root`
    pub fn from_nested(&self, schema: &DataSchema, value: &Value, root: &str) -> FlatRecord {
        let mut flat = FlatRecord::new();
        emit_flat(schema, value, root, &mut flat);
        flat
    }
}

fn take_nested(schema: &DataSchema, name: &str, remaining: &mut FlatRecord) -> Option<Value> {
    if schema.is_annotated() || !schema.is_object() {
        return remaining.remove(name);
    }

    let prefix = format!("{}{}", name, FIELD_SEPARATOR);
    if !remaining.keys().any(|key| key.starts_with(&prefix)) {
        return None;
    }

    let mut object = Map::new();
    for (member, child) in &schema.properties {
        if let Some(value) = take_nested(child, &compound_name(name, member), remaining) {
            object.insert(member.clone(), value);
        }
    }
    Some(Value::Object(object))
}

fn emit_flat(schema: &DataSchema, value: &Value, name: &str, flat: &mut FlatRecord) {
    if !schema.is_annotated() && schema.is_object() {
        if let Value::Object(object) = value {
            for (member, child) in &schema.properties {
                if let Some(member_value) = object.get(member) {
                    emit_flat(child, member_value, &compound_name(name, member), flat);
                }
            }
            return;
        }
    }

    flat.insert(name.to_string(), value.clone());
}
