//! Response decoding strategies.
//!
//! Each operation declares one `Decoding` up front; the decoder never guesses
//! from the call site. Every strategy yields a `serde_json::Value` which the
//! operation then converts into its typed result (text becomes a JSON string).

use serde_json::Value;
use tracing::warn;

use crate::error::ApiError;
use crate::http::HttpResponse;

/// How a successful response body is turned into a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoding {
    /// The whole body must be valid JSON.
    Json,
    /// The body is returned unmodified as a string.
    Text,
    /// Strict JSON under a JSON content type. Otherwise JSON when a body is
    /// present and the given fallback when it is empty.
    Lenient(EmptyBody),
}

/// Value substituted for an empty body under `Decoding::Lenient`.
#[derive(Debug, Clone, PartialEq)]
pub enum EmptyBody {
    Object,
    Array,
    /// `{"message": <text>}`
    Acknowledgment(&'static str),
    /// What the request wrote, in the shape the server would have echoed.
    Echo(Value),
}

impl EmptyBody {
    fn value(&self) -> Value {
        match self {
            EmptyBody::Object => Value::Object(Default::default()),
            EmptyBody::Array => Value::Array(Vec::new()),
            EmptyBody::Acknowledgment(message) => serde_json::json!({ "message": message }),
            EmptyBody::Echo(value) => value.clone(),
        }
    }
}

impl Decoding {
    /// Decode the body of a response already known to be successful.
    pub fn decode(&self, response: &HttpResponse) -> Result<Value, ApiError> {
        match self {
            Decoding::Json => parse_json(&response.body),
            Decoding::Text => Ok(Value::String(response.body.clone())),
            Decoding::Lenient(empty) => {
                if is_json(response.content_type()) {
                    return parse_json(&response.body);
                }
                if response.body.trim().is_empty() {
                    warn!(
                        status = response.status,
                        content_type = response.content_type().unwrap_or(""),
                        fallback = ?empty,
                        "empty response body, substituting default"
                    );
                    return Ok(empty.value());
                }
                // Some server versions send JSON without a JSON content type.
                parse_json(&response.body)
            }
        }
    }
}

fn is_json(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"))
}

fn parse_json(body: &str) -> Result<Value, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::decode(e.to_string()))
}
