use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::context::RunContext;
use crate::errorlog::normalize::NormalizedEvent;
use crate::events::EventPayload;

/// 2100-01-01T00:00:00Z. Document ids count down from this instant so that
/// ascending-key iteration over the table lists the newest records first.
/// Signed arithmetic on purpose: past 2100 the difference goes negative.
pub const REFERENCE_EPOCH_SECONDS: i64 = 4_102_444_800;

/// Builds the decreasing document id: `{reference - now}-{run_id}`.
pub fn log_id(now: DateTime<Utc>, run_id: &str) -> String {
    let decreasing = REFERENCE_EPOCH_SECONDS - now.timestamp();
    format!("{}-{}", decreasing, run_id)
}

/// One error-log document. Constructed fully in memory from a single request,
/// written once, never mutated. Deletion is time-driven through the table's
/// TTL policy on `expireAt`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorLogRecord {
    pub log_id: String,
    pub run_id: String,
    pub logged_at: DateTime<Utc>,
    /// Epoch seconds; the TTL attribute of the error-log table.
    pub expire_at: i64,
    pub event_name: String,
    pub error_types: Vec<String>,
    pub error_vars: Vec<String>,
    pub user_id: String,
    pub url_full: String,
    pub product_id: Option<String>,
    pub tealium_profile: String,
    pub data_layer: Value,
    pub error_data: Value,
}

impl ErrorLogRecord {
    pub fn build(
        payload: &EventPayload,
        normalized: &NormalizedEvent,
        ctx: &RunContext,
        retention_days: i64,
    ) -> ErrorLogRecord {
        let logged_at = ctx.received_at;
        let expire_at = (logged_at + Duration::days(retention_days)).timestamp();
        ErrorLogRecord {
            log_id: log_id(logged_at, &ctx.run_id),
            run_id: ctx.run_id.clone(),
            logged_at,
            expire_at,
            event_name: normalized.event_name.clone(),
            error_types: normalized.error_types.clone(),
            error_vars: normalized.error_vars.clone(),
            user_id: normalized.user_id.clone(),
            url_full: normalized.url_full.clone(),
            product_id: normalized.product_id.clone(),
            tealium_profile: normalized.tealium_profile.clone(),
            data_layer: Value::Object(payload.data_layer.clone()),
            error_data: payload
                .error_data
                .as_ref()
                .map(|e| Value::Object(e.data.clone()))
                .unwrap_or_else(|| Value::Object(Default::default())),
        }
    }

    /// Flattens the record into a DynamoDB item keyed by `logId`.
    pub fn to_item(&self) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();
        item.insert("logId".to_string(), AttributeValue::S(self.log_id.clone()));
        item.insert("runId".to_string(), AttributeValue::S(self.run_id.clone()));
        item.insert(
            "loggedAt".to_string(),
            AttributeValue::S(self.logged_at.to_rfc3339()),
        );
        item.insert(
            "expireAt".to_string(),
            AttributeValue::N(self.expire_at.to_string()),
        );
        item.insert(
            "eventName".to_string(),
            AttributeValue::S(self.event_name.clone()),
        );
        item.insert("errorTypes".to_string(), string_list(&self.error_types));
        item.insert("errorVars".to_string(), string_list(&self.error_vars));
        item.insert(
            "userId".to_string(),
            AttributeValue::S(self.user_id.clone()),
        );
        item.insert(
            "urlFull".to_string(),
            AttributeValue::S(self.url_full.clone()),
        );
        item.insert(
            "productId".to_string(),
            match &self.product_id {
                Some(id) => AttributeValue::S(id.clone()),
                None => AttributeValue::Null(true),
            },
        );
        item.insert(
            "tealiumProfile".to_string(),
            AttributeValue::S(self.tealium_profile.clone()),
        );
        item.insert("dataLayer".to_string(), to_attr(&self.data_layer));
        item.insert("errorData".to_string(), to_attr(&self.error_data));
        item
    }
}

fn string_list(values: &[String]) -> AttributeValue {
    AttributeValue::L(
        values
            .iter()
            .map(|v| AttributeValue::S(v.clone()))
            .collect(),
    )
}

/// Recursively maps a JSON value onto the DynamoDB attribute model.
pub fn to_attr(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(to_attr).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), to_attr(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_log_id_decreases_as_time_increases() {
        let t1 = Utc.with_ymd_and_hms(2022, 9, 17, 8, 34, 18).unwrap();
        let t2 = Utc.with_ymd_and_hms(2022, 9, 17, 8, 34, 19).unwrap();

        let prefix = |id: String| -> i64 {
            id.split('-')
                .next()
                .expect("log id has a numeric prefix")
                .parse()
                .expect("prefix is an integer")
        };

        // older event gets the larger prefix, so ascending iteration over the
        // ids yields newest-first
        assert!(prefix(log_id(t1, "R220917-103418-692")) > prefix(log_id(t2, "R220917-103419-000")));
    }

    #[test]
    fn test_log_id_known_value() {
        let now = Utc.with_ymd_and_hms(2022, 9, 17, 8, 34, 18).unwrap();
        let id = log_id(now, "R220917-103418-692");
        assert_eq!(
            id,
            format!("{}-R220917-103418-692", REFERENCE_EPOCH_SECONDS - now.timestamp())
        );
    }

    #[test]
    fn test_log_id_signed_past_reference_instant() {
        let beyond = Utc.with_ymd_and_hms(2100, 1, 1, 0, 0, 1).unwrap();
        let id = log_id(beyond, "R000101-000001-000");
        assert!(id.starts_with("-1-"), "got {}", id);
    }

    #[test]
    fn test_to_item_field_set() {
        let ctx = RunContext::at(Utc.with_ymd_and_hms(2022, 9, 17, 8, 34, 18).unwrap());
        let payload: EventPayload = serde_json::from_value(json!({
            "dataLayer": {"tealium_profile": "main", "prod_idUniques": 1},
            "errorData": {"data": {"fullOrRegExMatch": [{"var": "url_pathNoLang"}]}}
        }))
        .unwrap();
        let normalized = NormalizedEvent {
            event_name: "view__ecommerce__checkout_cart".to_string(),
            user_id: "017d0dad".to_string(),
            url_full: "https://www.somesite.ch/checkout/adresse".to_string(),
            product_id: None,
            tealium_profile: "main".to_string(),
            error_types: vec!["fullOrRegExMatch".to_string()],
            error_vars: vec!["url_pathNoLang".to_string()],
            summary: String::new(),
        };

        let record = ErrorLogRecord::build(&payload, &normalized, &ctx, 4);
        assert_eq!(
            record.expire_at,
            record.logged_at.timestamp() + 4 * 24 * 3600
        );

        let item = record.to_item();
        assert_eq!(
            item.get("logId"),
            Some(&AttributeValue::S(record.log_id.clone()))
        );
        assert_eq!(item.get("productId"), Some(&AttributeValue::Null(true)));
        assert_eq!(
            item.get("expireAt"),
            Some(&AttributeValue::N(record.expire_at.to_string()))
        );
        assert_eq!(
            item.get("errorTypes"),
            Some(&AttributeValue::L(vec![AttributeValue::S(
                "fullOrRegExMatch".to_string()
            )]))
        );
        // nested data layer keeps its structure
        match item.get("dataLayer") {
            Some(AttributeValue::M(map)) => {
                assert_eq!(
                    map.get("tealium_profile"),
                    Some(&AttributeValue::S("main".to_string()))
                );
                assert_eq!(
                    map.get("prod_idUniques"),
                    Some(&AttributeValue::N("1".to_string()))
                );
            }
            other => panic!("dataLayer is not a map: {:?}", other),
        }
    }

    #[test]
    fn test_to_attr_nested() {
        let value = json!({
            "s": "text",
            "n": 42.5,
            "b": true,
            "nothing": null,
            "list": ["a", {"inner": 1}]
        });
        let attr = to_attr(&value);
        let AttributeValue::M(map) = attr else {
            panic!("expected a map attribute");
        };
        assert_eq!(map.get("s"), Some(&AttributeValue::S("text".to_string())));
        assert_eq!(map.get("n"), Some(&AttributeValue::N("42.5".to_string())));
        assert_eq!(map.get("b"), Some(&AttributeValue::Bool(true)));
        assert_eq!(map.get("nothing"), Some(&AttributeValue::Null(true)));
        match map.get("list") {
            Some(AttributeValue::L(items)) => assert_eq!(items.len(), 2),
            other => panic!("list is not an L attribute: {:?}", other),
        }
    }
}
