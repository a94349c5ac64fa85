use serde_json::{Map, Value};

use crate::config::FieldNames;
use crate::events::EventPayload;

/// Placeholder defaults matching what the monitoring dashboards expect when a
/// payload arrives with fields missing.
const EVENT_NAME_MISSING: &str = "event_name missing";
const URL_MISSING: &str = "url_full missing";
const VALUE_MISSING: &str = "missing";
const VAR_MISSING: &str = "var missing";
const MESSAGE_MISSING: &str = "message missing";

/// The fields of an error event after defaulting. Construction never fails:
/// every lookup degrades to its placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEvent {
    pub event_name: String,
    pub user_id: String,
    pub url_full: String,
    pub product_id: Option<String>,
    pub tealium_profile: String,
    pub error_types: Vec<String>,
    pub error_vars: Vec<String>,
    pub summary: String,
}

pub fn normalize(payload: &EventPayload, fields: &FieldNames) -> NormalizedEvent {
    let layer = &payload.data_layer;
    let empty = Map::new();
    let error_data = payload.error_data.as_ref().map_or(&empty, |e| &e.data);

    let flattened = flatten_errors(error_data);

    NormalizedEvent {
        event_name: payload
            .event_name
            .clone()
            .unwrap_or_else(|| EVENT_NAME_MISSING.to_string()),
        user_id: string_field(layer, &fields.user_id, VALUE_MISSING),
        url_full: string_field(layer, &fields.url, URL_MISSING),
        product_id: layer
            .get(&fields.product_id)
            .and_then(|v| value_at_index(v, 0, None))
            .map(as_text),
        tealium_profile: string_field(layer, &fields.profile, VALUE_MISSING),
        error_types: flattened.types,
        error_vars: flattened.vars,
        summary: flattened.summary,
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct FlattenedErrors {
    /// Error-type names in encounter order, duplicates retained.
    pub types: Vec<String>,
    /// All `var` values in encounter order, duplicates retained.
    pub vars: Vec<String>,
    /// Human-readable listing of every var/message pair, for the log output.
    pub summary: String,
}

/// Walks the error-type -> error-detail mapping and accumulates the flat
/// type and var lists. Detail records missing `var` or `message` get their
/// placeholders independently; non-list detail values are skipped.
pub fn flatten_errors(data: &Map<String, Value>) -> FlattenedErrors {
    let mut flattened = FlattenedErrors::default();
    for (error_type, details) in data {
        flattened
            .summary
            .push_str(&format!("Errors of type: {}\n", error_type)); // eg "populatedAndOfType"
        flattened.types.push(error_type.clone());
        let Some(details) = details.as_array() else {
            continue;
        };
        for detail in details {
            let var = detail
                .get("var")
                .and_then(Value::as_str)
                .unwrap_or(VAR_MISSING);
            let message = detail
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or(MESSAGE_MISSING);
            flattened.summary.push_str(&format!("{}: {}\n", var, message));
            flattened.vars.push(var.to_string());
        }
    }
    flattened
}

/// Safe list-index lookup: returns `default` when the value is not a list or
/// the index is out of range.
pub fn value_at_index<'a>(
    value: &'a Value,
    idx: usize,
    default: Option<&'a Value>,
) -> Option<&'a Value> {
    match value.as_array() {
        Some(items) => items.get(idx).or(default),
        None => default,
    }
}

fn string_field(layer: &Map<String, Value>, key: &str, default: &str) -> String {
    match layer.get(key) {
        Some(Value::Null) | None => default.to_string(),
        Some(value) => as_text(value),
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
