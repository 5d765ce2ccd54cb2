//! GatewayRoute - one synthesized endpoint backed by one or more Things
//!
//! A route binds the same interaction(s) of N structurally identical Things
//! under a single URI and method:
//!
//! ```text
//!                 ┌──────────────── GatewayRoute ────────────────┐
//!  params, id? ──▶│ requests[0]: [ThingRequester, ...]  (Thing 0) │──▶ [record 0,
//!  filters?       │ requests[1]: [ThingRequester, ...]  (Thing 1) │     record 1,
//!                 │ ...                                           │     ...]
//!                 └───────────────────────────────────────────────┘
//! ```
//!
//! With more than one Thing the route is *aggregated*: records carry a
//! positional `id`, and writes or actions must name the target Thing.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use wotgate_core::routing::route_uri;
use wotgate_core::{
    DataField, FlatRecord, GatewayError, GatewayResult, InteractionDescriptor, Method,
    SchemaTranslator, Thing, ThingTransport, Verb,
};

use crate::requester::ThingRequester;

/// Name of the synthetic field addressing one Thing of an aggregated route
pub const ID_FIELD: &str = "id";
/// Semantic type of the synthetic id field
pub const ID_RDF_URI: &str = "http://schema.org/identifier";
/// Lower-bound filter prefix
pub const MIN_FILTER_PREFIX: &str = "min_";
/// Upper-bound filter prefix
pub const MAX_FILTER_PREFIX: &str = "max_";

/// Range filters: `min_<field>` / `max_<field>` → bound
pub type RangeFilters = BTreeMap<String, f64>;

/// What to expose through a route
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(default)]
    pub write: bool,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub use_property_filters: bool,
}

impl RouteRequest {
    /// Read one property, or several merged into one record per Thing
    pub fn read<I, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            properties: properties.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn write(property: impl Into<String>) -> Self {
        Self {
            properties: vec![property.into()],
            write: true,
            ..Self::default()
        }
    }

    pub fn action(name: impl Into<String>) -> Self {
        Self {
            action: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_property_filters(mut self) -> Self {
        self.use_property_filters = true;
        self
    }

    /// Decide the route semantic, or explain why there is none
    fn classify(&self) -> Result<RouteKind, String> {
        match (&self.action, self.properties.len()) {
            (Some(_), 0) => Ok(RouteKind::Action),
            (Some(_), _) => Err("a route exposes either an action or properties, not both".into()),
            (None, 0) => Err("a route needs an action or at least one property".into()),
            (None, 1) if self.write => Ok(RouteKind::Write),
            (None, 1) => Ok(RouteKind::Read),
            (None, _) => {
                if self.write {
                    warn!(properties = ?self.properties, "Write flag ignored on a multi-property route");
                }
                Ok(RouteKind::MergeRead)
            }
        }
    }

    /// Interaction part of the route URI
    fn interaction_name(&self) -> String {
        match &self.action {
            Some(action) => action.clone(),
            None => self.properties.join("-"),
        }
    }
}

/// Route semantic, decided once at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    Action,
    Write,
    Read,
    MergeRead,
}

impl RouteKind {
    /// Method the route is served with
    pub fn method(&self) -> Method {
        match self {
            RouteKind::Action | RouteKind::Write => Method::Post,
            RouteKind::Read | RouteKind::MergeRead => Method::Get,
        }
    }

    /// URI mode segment
    fn mode(&self) -> &'static str {
        match self {
            RouteKind::Action => "",
            RouteKind::Write => "Write-",
            RouteKind::Read | RouteKind::MergeRead => "Read-",
        }
    }
}

/// One backing Thing that failed during a fan-out
#[derive(Debug, Clone)]
pub struct ThingFailure {
    /// Positional id of the Thing within the route
    pub id: usize,
    pub thing: String,
    pub error: GatewayError,
}

/// Outcome of a route access
#[derive(Debug, Clone, Default)]
pub struct AccessResult {
    /// Flat records in backing-Thing order
    pub records: Vec<FlatRecord>,
    /// Things that failed while others succeeded
    pub failures: Vec<ThingFailure>,
}

impl AccessResult {
    fn single(record: FlatRecord) -> Self {
        Self {
            records: vec![record],
            failures: Vec::new(),
        }
    }

    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Serializable view of a route
#[derive(Debug, Clone, Serialize)]
pub struct RouteSummary {
    pub uri: String,
    pub method: Method,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<RouteKind>,
    pub things: Vec<String>,
    pub input_schema: Vec<DataField>,
    pub output_schema: Vec<DataField>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub property_filters_schema: Vec<DataField>,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_reason: Option<String>,
    pub registered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offering_id: Option<String>,
    pub needs_id: bool,
}

/// A synthesized proxy endpoint over one or more Things
#[derive(Debug)]
pub struct GatewayRoute {
    uri: String,
    kind: Option<RouteKind>,
    method: Method,
    things: Vec<String>,
    input_schema: Vec<DataField>,
    output_schema: Vec<DataField>,
    property_filters_schema: Vec<DataField>,
    valid: bool,
    invalid_reason: Option<String>,
    registered: bool,
    offering_id: Option<String>,
    /// Outer index: backing Thing; inner index: interaction within that Thing
    requests: Vec<Vec<ThingRequester>>,
}

struct Assembled {
    requests: Vec<Vec<ThingRequester>>,
    input_schema: Vec<DataField>,
    output_schema: Vec<DataField>,
    property_filters_schema: Vec<DataField>,
}

impl GatewayRoute {
    /// Build a route over `things`.
    ///
    /// Never fails: a route whose interactions cannot be resolved on every
    /// Thing comes back with `is_valid() == false` and the reason kept in
    /// `invalid_reason()`.
    pub fn build(
        things: &[Thing],
        request: RouteRequest,
        transport: Arc<dyn ThingTransport>,
        translator: &SchemaTranslator,
    ) -> Self {
        let kind = request.classify();
        let mode = kind.as_ref().map(RouteKind::mode).unwrap_or_default();
        let title = things.first().map(|t| t.title.as_str()).unwrap_or_default();
        let uri = route_uri(title, mode, &request.interaction_name());

        let mut route = Self {
            uri,
            kind: kind.as_ref().ok().copied(),
            method: kind.as_ref().map(RouteKind::method).unwrap_or(Method::Get),
            things: things.iter().map(|t| t.title.clone()).collect(),
            input_schema: Vec::new(),
            output_schema: Vec::new(),
            property_filters_schema: Vec::new(),
            valid: false,
            invalid_reason: None,
            registered: false,
            offering_id: None,
            requests: Vec::new(),
        };

        let assembled = kind.and_then(|kind| {
            if things.is_empty() {
                return Err("a route needs at least one backing Thing".to_string());
            }
            Self::assemble(things, &request, kind, &transport, translator)
                .map_err(|e| e.to_string())
        });

        match assembled {
            Ok(assembled) => {
                route.requests = assembled.requests;
                route.input_schema = assembled.input_schema;
                route.output_schema = assembled.output_schema;
                route.property_filters_schema = assembled.property_filters_schema;
                route.valid = true;
                debug!(
                    uri = %route.uri,
                    method = %route.method,
                    things = route.things.len(),
                    "Built gateway route"
                );
            }
            Err(reason) => {
                warn!(uri = %route.uri, reason = %reason, "Gateway route is invalid");
                route.invalid_reason = Some(reason);
            }
        }

        route
    }

    fn assemble(
        things: &[Thing],
        request: &RouteRequest,
        kind: RouteKind,
        transport: &Arc<dyn ThingTransport>,
        translator: &SchemaTranslator,
    ) -> GatewayResult<Assembled> {
        let mut requests = Vec::with_capacity(things.len());
        for thing in things {
            let descriptors = match (kind, &request.action) {
                (RouteKind::Action, Some(action)) => {
                    vec![InteractionDescriptor::for_action(thing, action)?]
                }
                (RouteKind::Write, _) => request
                    .properties
                    .iter()
                    .map(|p| InteractionDescriptor::for_property(thing, p, Verb::Write))
                    .collect::<GatewayResult<Vec<_>>>()?,
                _ => request
                    .properties
                    .iter()
                    .map(|p| InteractionDescriptor::for_property(thing, p, Verb::Read))
                    .collect::<GatewayResult<Vec<_>>>()?,
            };

            requests.push(
                descriptors
                    .into_iter()
                    .map(|d| ThingRequester::new(d, Arc::clone(transport), translator.clone()))
                    .collect::<Vec<_>>(),
            );
        }

        // Schemas come from the first Thing; the others are assumed identical
        let representative = &things[0];
        let mut input_schema = Vec::new();
        let mut output_schema = Vec::new();
        for requester in &requests[0] {
            let descriptor = requester.descriptor();
            if let Some(schema) = &descriptor.input_schema {
                input_schema.extend(translator.flatten(
                    schema,
                    &descriptor.interaction,
                    &representative.context,
                ));
            }
            if let Some(schema) = &descriptor.output_schema {
                output_schema.extend(translator.flatten(
                    schema,
                    &descriptor.interaction,
                    &representative.context,
                ));
            }
        }

        let aggregated = things.len() > 1;
        let merge_aggregated = aggregated && kind == RouteKind::MergeRead;
        if aggregated {
            input_schema.push(id_field());
        }
        if merge_aggregated {
            output_schema.insert(0, id_field());
        }

        let property_filters_schema = if merge_aggregated && request.use_property_filters {
            filter_fields(&output_schema)
        } else {
            if request.use_property_filters {
                debug!("Property filters only apply to aggregated multi-property reads");
            }
            Vec::new()
        };

        Ok(Assembled {
            requests,
            input_schema,
            output_schema,
            property_filters_schema,
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Route semantic; `None` when the request itself was contradictory
    pub fn kind(&self) -> Option<RouteKind> {
        self.kind
    }

    /// Titles of the backing Things, in positional order
    pub fn things(&self) -> &[String] {
        &self.things
    }

    pub fn input_schema(&self) -> &[DataField] {
        &self.input_schema
    }

    pub fn output_schema(&self) -> &[DataField] {
        &self.output_schema
    }

    pub fn property_filters_schema(&self) -> &[DataField] {
        &self.property_filters_schema
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn invalid_reason(&self) -> Option<&str> {
        self.invalid_reason.as_deref()
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Marketplace id of the published offering
    pub fn offering_id(&self) -> Option<&str> {
        self.offering_id.as_deref()
    }

    /// Record that the route was published as `offering_id`
    pub fn mark_registered(&mut self, offering_id: impl Into<String>) {
        self.registered = true;
        self.offering_id = Some(offering_id.into());
    }

    pub fn requests(&self) -> &[Vec<ThingRequester>] {
        &self.requests
    }

    pub fn is_aggregated(&self) -> bool {
        self.things.len() > 1
    }

    /// Aggregated writes and actions must name their target Thing
    pub fn needs_id(&self) -> bool {
        self.is_aggregated() && matches!(self.kind, Some(RouteKind::Action | RouteKind::Write))
    }

    pub fn has_filters(&self) -> bool {
        !self.property_filters_schema.is_empty()
    }

    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            uri: self.uri.clone(),
            method: self.method,
            kind: self.kind,
            things: self.things.clone(),
            input_schema: self.input_schema.clone(),
            output_schema: self.output_schema.clone(),
            property_filters_schema: self.property_filters_schema.clone(),
            valid: self.valid,
            invalid_reason: self.invalid_reason.clone(),
            registered: self.registered,
            offering_id: self.offering_id.clone(),
            needs_id: self.needs_id(),
        }
    }

    /// Run the route.
    ///
    /// With an `id` on an aggregated route only that Thing is asked. Without
    /// one every Thing is asked concurrently; records come back in
    /// backing-Thing order and, when the route exposes filters, records
    /// outside `filters` are dropped. In a multi-Thing fan-out, Things that
    /// fail are reported in [`AccessResult::failures`]; the call fails only
    /// when all of them did.
    pub async fn access(
        &self,
        params: &FlatRecord,
        id: Option<i64>,
        filters: Option<&RangeFilters>,
    ) -> GatewayResult<AccessResult> {
        if !self.valid {
            return Err(GatewayError::RouteInvalid(
                self.invalid_reason
                    .clone()
                    .unwrap_or_else(|| self.uri.clone()),
            ));
        }

        let aggregated = self.is_aggregated();

        if let (Some(id), true) = (id, aggregated) {
            let count = self.requests.len();
            let index = usize::try_from(id)
                .ok()
                .filter(|index| *index < count)
                .ok_or(GatewayError::InvalidId { id, count })?;

            let mut record = self.request_thing(index, params).await?;
            if !record.is_empty() {
                record.insert(ID_FIELD.to_string(), Value::from(index));
            }
            return Ok(AccessResult::single(record));
        }

        if self.needs_id() {
            return Err(GatewayError::IdRequired(self.uri.clone()));
        }

        let outcomes = join_all(
            (0..self.requests.len()).map(|index| self.request_thing(index, params)),
        )
        .await;

        if !aggregated {
            let record = outcomes
                .into_iter()
                .next()
                .unwrap_or_else(|| Ok(FlatRecord::new()))?;
            return Ok(AccessResult::single(record));
        }

        let active_filters = filters.filter(|_| self.has_filters());
        let mut result = AccessResult::default();
        let mut first_error = None;

        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(mut record) => {
                    record.insert(ID_FIELD.to_string(), Value::from(index));
                    if active_filters.map_or(true, |f| passes_filters(&record, f)) {
                        result.records.push(record);
                    }
                }
                Err(error) => {
                    warn!(
                        uri = %self.uri,
                        id = index,
                        thing = %self.things[index],
                        error = %error,
                        "Thing failed during fan-out"
                    );
                    if first_error.is_none() {
                        first_error = Some(error.clone());
                    }
                    result.failures.push(ThingFailure {
                        id: index,
                        thing: self.things[index].clone(),
                        error,
                    });
                }
            }
        }

        if result.failures.len() == self.requests.len() {
            if let Some(error) = first_error {
                return Err(error);
            }
        }

        Ok(result)
    }

    /// Run all interactions of one Thing and merge them into one record
    async fn request_thing(&self, index: usize, params: &FlatRecord) -> GatewayResult<FlatRecord> {
        let outcomes = join_all(
            self.requests[index]
                .iter()
                .map(|requester| requester.make_request(params)),
        )
        .await;

        let mut merged = FlatRecord::new();
        for outcome in outcomes {
            merged.extend(outcome?);
        }
        Ok(merged)
    }
}

fn id_field() -> DataField {
    DataField::new(ID_FIELD, ID_RDF_URI)
}

/// `min_`/`max_` pair per non-id output field
fn filter_fields(output_schema: &[DataField]) -> Vec<DataField> {
    output_schema
        .iter()
        .filter(|field| field.name != ID_FIELD)
        .flat_map(|field| {
            [MIN_FILTER_PREFIX, MAX_FILTER_PREFIX]
                .into_iter()
                .map(move |prefix| {
                    DataField::new(format!("{}{}", prefix, field.name), field.rdf_uri.clone())
                })
        })
        .collect()
}

/// Whether `record` satisfies every range filter.
///
/// A missing or non-numeric field fails any filter on it. Keys without a
/// `min_`/`max_` prefix are ignored.
pub fn passes_filters(record: &FlatRecord, filters: &RangeFilters) -> bool {
    filters.iter().all(|(key, bound)| {
        if let Some(field) = key.strip_prefix(MIN_FILTER_PREFIX) {
            numeric(record, field).is_some_and(|value| value >= *bound)
        } else if let Some(field) = key.strip_prefix(MAX_FILTER_PREFIX) {
            numeric(record, field).is_some_and(|value| value <= *bound)
        } else {
            true
        }
    })
}

fn numeric(record: &FlatRecord, field: &str) -> Option<f64> {
    record.get(field).and_then(Value::as_f64)
}
