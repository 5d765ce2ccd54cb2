//! Form resolution - picking and interpreting a Thing's protocol bindings
//!
//! A Thing interaction usually offers several forms. For a gateway request
//! we need exactly one, plus the protocol and method to use with it:
//!
//! ```text
//! forms ──resolve_form(verb)──▶ Form ──InteractionDescriptor──▶ {protocol, method, url}
//! ```

use tracing::warn;
use url::Url;
use wotgate_conv::DataSchema;

use crate::error::{GatewayError, GatewayResult};
use crate::models::{Form, Method, Protocol, Thing, Verb};

/// Default content type for request bodies
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Select the form to use for `verb`.
///
/// A single form is always used. Otherwise every form is scanned: a form
/// tagged with the verb wins, and a later tagged match replaces an earlier
/// one; the first untagged form is kept as a fallback until a tagged match
/// turns up.
pub fn resolve_form(forms: &[Form], verb: Verb) -> Option<&Form> {
    if let [only] = forms {
        return Some(only);
    }

    let mut selected: Option<&Form> = None;
    let mut matched = false;

    for form in forms {
        if form.supports(verb) {
            selected = Some(form);
            matched = true;
        } else if !form.is_tagged() && !matched && selected.is_none() {
            selected = Some(form);
        }
    }

    selected
}

/// A resolved binding of one Thing interaction for one verb
#[derive(Debug, Clone)]
pub struct InteractionDescriptor {
    /// Title of the Thing this binding belongs to
    pub thing: String,
    /// Property or action name; also the root of flattened field names
    pub interaction: String,
    pub verb: Verb,
    pub protocol: Protocol,
    pub method: Method,
    pub url: Url,
    /// Content type for request bodies
    pub content_type: String,
    pub input_schema: Option<DataSchema>,
    pub output_schema: Option<DataSchema>,
}

impl InteractionDescriptor {
    /// Resolve a property for reading (`Verb::Read`) or writing (`Verb::Write`).
    ///
    /// Reads carry the property schema as output, writes as input.
    pub fn for_property(thing: &Thing, name: &str, verb: Verb) -> GatewayResult<Self> {
        let property = thing
            .property(name)
            .ok_or_else(|| GatewayError::InteractionNotFound {
                thing: thing.title.clone(),
                interaction: name.to_string(),
            })?;

        let (input, output) = match verb {
            Verb::Write => (Some(property.schema.clone()), None),
            _ => (None, Some(property.schema.clone())),
        };

        Self::resolve(thing, name, verb, &property.forms, input, output)
    }

    /// Resolve an action for invocation
    pub fn for_action(thing: &Thing, name: &str) -> GatewayResult<Self> {
        let action = thing
            .action(name)
            .ok_or_else(|| GatewayError::InteractionNotFound {
                thing: thing.title.clone(),
                interaction: name.to_string(),
            })?;

        Self::resolve(
            thing,
            name,
            Verb::Invoke,
            &action.forms,
            action.input.clone(),
            action.output.clone(),
        )
    }

    fn resolve(
        thing: &Thing,
        name: &str,
        verb: Verb,
        forms: &[Form],
        input_schema: Option<DataSchema>,
        output_schema: Option<DataSchema>,
    ) -> GatewayResult<Self> {
        let no_form = || GatewayError::NoCompatibleForm {
            thing: thing.title.clone(),
            interaction: name.to_string(),
        };

        let form = resolve_form(forms, verb).ok_or_else(no_form)?;
        let url = resolve_href(thing.base.as_deref(), &form.href).ok_or_else(no_form)?;
        let protocol = infer_protocol(form, &url).ok_or_else(no_form)?;
        let method = infer_method(form, protocol, verb);

        Ok(Self {
            thing: thing.title.clone(),
            interaction: name.to_string(),
            verb,
            protocol,
            method,
            url,
            content_type: form
                .content_type
                .clone()
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            input_schema,
            output_schema,
        })
    }
}

/// Resolve a form href, relative hrefs against the Thing's base
fn resolve_href(base: Option<&str>, href: &str) -> Option<Url> {
    match Url::parse(href) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(base?).ok()?.join(href).ok(),
        Err(_) => None,
    }
}

/// Explicit protocol hints win over the URL scheme
fn infer_protocol(form: &Form, url: &Url) -> Option<Protocol> {
    if form.http_method.is_some() {
        Some(Protocol::Http)
    } else if form.coap_method.is_some() {
        Some(Protocol::Coap)
    } else {
        Protocol::from_scheme(url.scheme())
    }
}

fn infer_method(form: &Form, protocol: Protocol, verb: Verb) -> Method {
    let hint = match protocol {
        Protocol::Http => form.http_method.as_deref(),
        Protocol::Coap => form.coap_method.as_deref(),
    };

    match hint {
        Some(hint) => hint.parse().unwrap_or_else(|e| {
            warn!(href = %form.href, error = %e, "Unusable method hint, falling back to GET");
            Method::Get
        }),
        None => verb.default_method(),
    }
}
