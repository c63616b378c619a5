//! Proxy-style response envelope returned to the API dispatcher.
//!
//! Every response carries a JSON content type and a permissive CORS origin.
//! Domain errors are rendered as `{"message": ..., <details>}` with a status
//! derived from their [`ErrorCode`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::error;

use crate::domain::{Error, ErrorCode};

pub const CONTENT_TYPE: &str = "Content-Type";
pub const ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";

/// `{statusCode, headers, body}` as understood by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        (CONTENT_TYPE.to_owned(), "application/json".to_owned()),
        (ALLOW_ORIGIN.to_owned(), "*".to_owned()),
    ])
}

pub(crate) fn status_for(code: ErrorCode) -> u16 {
    match code {
        ErrorCode::InvalidRequest => 400,
        ErrorCode::Unauthorized => 401,
        ErrorCode::NotFound => 404,
        ErrorCode::MethodNotAllowed => 405,
        ErrorCode::InternalError => 500,
    }
}

impl ResponseEnvelope {
    /// Serialise `payload` as the body.
    pub fn json(status_code: u16, payload: &impl Serialize) -> Self {
        match serde_json::to_string(payload) {
            Ok(body) => Self {
                status_code,
                headers: default_headers(),
                body,
            },
            Err(err) => {
                error!(error = %err, "response serialisation failed");
                Self::from_error(&Error::internal("Failed to serialise response").caused_by(err))
            }
        }
    }

    /// Empty body, used for `204`.
    pub fn no_content() -> Self {
        Self {
            status_code: 204,
            headers: default_headers(),
            body: String::new(),
        }
    }

    /// Render a domain error.
    pub fn from_error(err: &Error) -> Self {
        let mut body = Map::new();
        body.insert("message".to_owned(), Value::String(err.message().to_owned()));
        if let Some(details) = err.details() {
            for (key, value) in details {
                body.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        if let Some(id) = err.invocation_id() {
            body.insert("invocationId".to_owned(), Value::String(id.to_owned()));
        }
        let body = Value::Object(body).to_string();
        Self {
            status_code: status_for(err.code()),
            headers: default_headers(),
            body,
        }
    }

    /// Parse the body back into JSON; `Value::Null` for an empty body.
    pub fn body_json(&self) -> Result<Value, serde_json::Error> {
        if self.body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(Error::invalid_request("bad"), 400)]
    #[case(Error::unauthorized("who"), 401)]
    #[case(Error::not_found("gone"), 404)]
    #[case(Error::method_not_allowed("Method Not Allowed"), 405)]
    #[case(Error::internal("boom"), 500)]
    fn error_codes_map_to_statuses(#[case] err: Error, #[case] status: u16) {
        assert_eq!(ResponseEnvelope::from_error(&err).status_code, status);
    }

    #[rstest]
    fn error_details_are_flattened_next_to_message() {
        let err = Error::internal("Failed to add expense")
            .caused_by("throttled")
            .with_detail("message", "ignored");
        let response = ResponseEnvelope::from_error(&err);

        assert_eq!(
            response.body_json().expect("json body"),
            json!({"message": "Failed to add expense", "error": "throttled"})
        );
    }

    #[rstest]
    fn every_response_allows_any_origin() {
        for response in [
            ResponseEnvelope::json(200, &json!({"message": "ok"})),
            ResponseEnvelope::no_content(),
            ResponseEnvelope::from_error(&Error::not_found("gone")),
        ] {
            assert_eq!(response.headers.get(ALLOW_ORIGIN).map(String::as_str), Some("*"));
            assert_eq!(
                response.headers.get(CONTENT_TYPE).map(String::as_str),
                Some("application/json")
            );
        }
    }

    #[rstest]
    fn serialises_with_dispatcher_field_names() {
        let value = serde_json::to_value(ResponseEnvelope::no_content()).expect("serialise");
        assert_eq!(value["statusCode"], json!(204));
        assert_eq!(value["body"], json!(""));
    }
}
