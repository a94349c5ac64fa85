use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Top-level body of the webhook POST.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectorRequest {
    pub token: Option<String>,
    pub event_payload: Option<Value>,
}

/// The tag-management event payload. Every field is optional; the sending
/// platform assembles this structure in user-maintained code and routinely
/// omits keys.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventPayload {
    pub script: Option<String>,
    pub script_type: Option<String>,
    pub event_name: Option<String>,
    pub data_layer: Map<String, Value>,
    pub error_data: Option<ErrorData>,
    pub event_map: Option<String>,
}

/// Mapping of error-type name to a sequence of `{var, message}` records. Kept
/// as loose JSON so malformed entries degrade to defaults instead of failing
/// deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorData {
    #[serde(default)]
    pub data: Map<String, Value>,
}

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("eventPayload field is missing from the request body")]
    Missing,
    #[error("eventPayload is not valid JSON - {0}")]
    Invalid(#[from] serde_json::Error),
}

impl CollectorRequest {
    /// Decodes `eventPayload`, tolerating double encoding: the platform
    /// sometimes serializes the payload to a JSON string before embedding it
    /// in the request body.
    pub fn decode_event_payload(&self) -> Result<EventPayload, PayloadError> {
        match &self.event_payload {
            Some(Value::String(s)) => Ok(serde_json::from_str(s)?),
            Some(value) => Ok(serde_json::from_value(value.clone())?),
            None => Err(PayloadError::Missing),
        }
    }
}
