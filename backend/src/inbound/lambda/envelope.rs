//! Detection and normalisation of the API dispatcher's event envelopes.
//!
//! The same function is reachable through several front doors, each of which
//! places the HTTP method somewhere else. Shapes are tried in a fixed order and
//! the first whose marker is present wins; an event matching none of them is
//! [`Envelope::Unrecognized`].

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::Error;

/// Known envelope shapes, in detection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeShape {
    /// REST API proxy integration: top-level `httpMethod`.
    RestApi,
    /// HTTP API (payload v2): `requestContext.http.method`.
    HttpApi,
    /// Proxy integration with the method only in `requestContext.httpMethod`.
    ContextProxy,
    /// Direct invocation: top-level `method`.
    Direct,
}

impl EnvelopeShape {
    pub const DETECTION_ORDER: [Self; 4] =
        [Self::RestApi, Self::HttpApi, Self::ContextProxy, Self::Direct];

    /// Whether the shape's marker key is present in `event`.
    fn matches(self, event: &Map<String, Value>) -> bool {
        let context = event.get("requestContext").and_then(Value::as_object);
        match self {
            Self::RestApi => event.contains_key("httpMethod"),
            Self::HttpApi => context.is_some_and(|ctx| ctx.contains_key("http")),
            Self::ContextProxy => context.is_some_and(|ctx| ctx.contains_key("httpMethod")),
            Self::Direct => event.contains_key("method"),
        }
    }

    fn method(self, event: &Map<String, Value>) -> Result<Option<String>, EnvelopeError> {
        let slot = match self {
            Self::RestApi => event.get("httpMethod"),
            Self::HttpApi => {
                let http = event
                    .get("requestContext")
                    .and_then(|ctx| ctx.get("http"))
                    .and_then(Value::as_object)
                    .ok_or(EnvelopeError::Malformed {
                        field: "requestContext.http",
                        expected: "an object",
                    })?;
                Some(http.get("method").ok_or(EnvelopeError::Malformed {
                    field: "requestContext.http.method",
                    expected: "to be present",
                })?)
            }
            Self::ContextProxy => event
                .get("requestContext")
                .and_then(|ctx| ctx.get("httpMethod")),
            Self::Direct => event.get("method"),
        };

        match slot {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(method)) if method.trim().is_empty() => Ok(None),
            Some(Value::String(method)) => Ok(Some(method.trim().to_ascii_uppercase())),
            Some(_) => Err(EnvelopeError::Malformed {
                field: "method",
                expected: "a string",
            }),
        }
    }
}

/// Failures while extracting fields from a recognised envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("Could not determine HTTP method")]
    MissingMethod,
    #[error("{field} was expected {expected}")]
    Malformed {
        field: &'static str,
        expected: &'static str,
    },
}

impl From<EnvelopeError> for Error {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::MissingMethod => Error::invalid_request(err.to_string()),
            EnvelopeError::Malformed { .. } => {
                Error::internal("Internal server error during event parsing").caused_by(err)
            }
        }
    }
}

/// Uniform view of an API request, whatever envelope carried it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRequest {
    pub shape: EnvelopeShape,
    /// Upper-cased HTTP method.
    pub method: String,
    pub path_parameters: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    /// Raw body: JSON text from a gateway, or an already-decoded value from a
    /// direct invocation. `None` when absent or `null`.
    pub body: Option<Value>,
    pub headers: BTreeMap<String, String>,
}

impl NormalizedRequest {
    /// Non-blank path parameter.
    pub fn path_parameter(&self, name: &str) -> Option<&str> {
        self.path_parameters
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// Query string parameter.
    pub fn query_parameter(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

/// Result of envelope detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope<'a> {
    Known {
        shape: EnvelopeShape,
        fields: &'a Map<String, Value>,
    },
    Unrecognized {
        /// Top-level keys present, for diagnosis.
        keys: Vec<String>,
        /// The event looks like a service notification (`Records`).
        service_event: bool,
    },
}

/// Classify `event` by the first matching shape.
pub fn detect(event: &Value) -> Envelope<'_> {
    let Some(fields) = event.as_object() else {
        return Envelope::Unrecognized {
            keys: Vec::new(),
            service_event: false,
        };
    };

    EnvelopeShape::DETECTION_ORDER
        .into_iter()
        .find(|shape| shape.matches(fields))
        .map_or_else(
            || Envelope::Unrecognized {
                keys: fields.keys().cloned().collect(),
                service_event: fields.contains_key("Records"),
            },
            |shape| Envelope::Known { shape, fields },
        )
}

impl Envelope<'_> {
    /// Extract the uniform request, or the error response for this envelope.
    pub fn into_request(self) -> Result<NormalizedRequest, Error> {
        match self {
            Self::Known { shape, fields } => Ok(extract(shape, fields)?),
            Self::Unrecognized { keys, .. } => {
                Err(Error::invalid_request("Unknown event format").with_detail("event_keys", keys))
            }
        }
    }
}

fn extract(
    shape: EnvelopeShape,
    fields: &Map<String, Value>,
) -> Result<NormalizedRequest, EnvelopeError> {
    let method = shape.method(fields)?.ok_or(EnvelopeError::MissingMethod)?;
    Ok(NormalizedRequest {
        shape,
        method,
        path_parameters: string_map(fields, "pathParameters")?,
        query: string_map(fields, "queryStringParameters")?,
        body: fields.get("body").filter(|body| !body.is_null()).cloned(),
        headers: string_map(fields, "headers")?,
    })
}

// Absent or null maps are empty; scalar values are kept as text.
fn string_map(
    fields: &Map<String, Value>,
    key: &'static str,
) -> Result<BTreeMap<String, String>, EnvelopeError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(BTreeMap::new()),
        Some(Value::Object(map)) => Ok(map
            .iter()
            .filter_map(|(name, value)| {
                let text = match value {
                    Value::String(text) => text.clone(),
                    Value::Number(number) => number.to_string(),
                    Value::Bool(flag) => flag.to_string(),
                    _ => return None,
                };
                Some((name.clone(), text))
            })
            .collect()),
        Some(_) => Err(EnvelopeError::Malformed {
            field: key,
            expected: "an object",
        }),
    }
}
