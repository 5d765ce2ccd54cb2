//! wotgate-conv - Schema translation for Thing/Offering bridging
//!
//! WoT Things describe their data as nested JSON schemas; marketplace
//! Offerings only know flat, named input and output fields. This crate
//! converts between the two:
//!
//! - **flatten** - nested schema → ordered list of [`DataField`]s with
//!   compound names (`weather_wind_speed`) and semantic URIs
//! - **to_nested** - flat record → nested value the Thing accepts
//! - **from_nested** - nested Thing value → flat record
//!
//! # Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use wotgate_conv::{DataSchema, JsonLdContext, SchemaTranslator};
//!
//! let schema = DataSchema::object([
//!     ("temp", DataSchema::primitive("number")),
//!     ("unit", DataSchema::primitive("string")),
//! ]);
//! let translator = SchemaTranslator::default();
//!
//! let fields = translator.flatten(&schema, "reading", &JsonLdContext::default());
//! assert_eq!(fields[0].name, "reading_temp");
//! assert_eq!(fields[0].rdf_uri, "http://schema.org/Number");
//!
//! let flat = translator.from_nested(&schema, &json!({"temp": 20, "unit": "C"}), "reading");
//! assert_eq!(flat["reading_unit"], json!("C"));
//!
//! let nested = translator.to_nested(&schema, &flat, "reading").unwrap();
//! assert_eq!(nested, json!({"temp": 20, "unit": "C"}));
//! ```
//!
//! # Semantic URIs
//!
//! | Schema node | Field URI |
//! |-------------|-----------|
//! | annotated (`@type`) | first annotation, prefix expanded via `@context` |
//! | `string` / `boolean` / `number` / `integer` / `float` | `http://schema.org/{Text,Boolean,Number,Integer,Float}` |
//! | anything else | the translator's fallback URI (logged) |

pub mod schema;
pub mod semantic;
pub mod translate;

pub use schema::{one_or_many, DataField, DataSchema, JsonLdContext};
pub use semantic::{primitive_uri, replace_prefix, DEFAULT_FALLBACK_URI};
pub use translate::{compound_name, FlatRecord, SchemaTranslator, FIELD_SEPARATOR};
