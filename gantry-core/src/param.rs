// Parameter extraction sources

use crate::HttpRequest;
use serde_json::Value;

/// Where one handler argument is read from on an inbound request.
///
/// Extraction is a pure read: a missing field yields `Value::Null`, never
/// an error. "Required field" semantics belong to application code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamSource {
    /// A named field of the JSON request body
    FromBody(String),
    /// A named query-string parameter
    FromQuery(String),
    /// A named path-template parameter (`/:name` segments)
    FromRoute(String),
    /// The whole JSON request body
    WholeBody,
}

impl ParamSource {
    /// Extract one argument value from the request.
    pub fn extract(&self, req: &HttpRequest) -> Value {
        match self {
            ParamSource::FromBody(field) => req
                .body_json()
                .and_then(|body| body.get(field.as_str()).cloned())
                .unwrap_or(Value::Null),
            ParamSource::FromQuery(name) => req
                .query(name)
                .map(|v| Value::String(v.clone()))
                .unwrap_or(Value::Null),
            ParamSource::FromRoute(name) => req
                .param(name)
                .map(|v| Value::String(v.clone()))
                .unwrap_or(Value::Null),
            ParamSource::WholeBody => req.body_json().unwrap_or(Value::Null),
        }
    }
}
