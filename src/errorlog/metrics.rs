use lambda_runtime::Error;
use opentelemetry_proto::tonic::collector::metrics::v1::ExportMetricsServiceRequest;
use opentelemetry_proto::tonic::common::v1::any_value;
use opentelemetry_proto::tonic::common::v1::AnyValue;
use opentelemetry_proto::tonic::common::v1::KeyValue;
use opentelemetry_proto::tonic::metrics::v1::{
    metric, number_data_point, AggregationTemporality, Metric, NumberDataPoint, ResourceMetrics,
    ScopeMetrics, Sum,
};
use prost::Message;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::errorlog::record::ErrorLogRecord;

const COUNTER_NAME: &str = "datalayer.error.events";

fn string_attribute(key: &str, value: &str) -> KeyValue {
    KeyValue {
        key: key.to_string(),
        value: Some(AnyValue {
            value: Some(any_value::Value::StringValue(value.to_string())),
        }),
    }
}

/// One counter increment per error event, labeled by event name and profile.
fn counter_request(record: &ErrorLogRecord) -> ExportMetricsServiceRequest {
    let mut data_point = NumberDataPoint::default();
    data_point.time_unix_nano = record
        .logged_at
        .timestamp_nanos_opt()
        .unwrap_or_default() as u64;
    data_point.attributes = vec![
        string_attribute("event_name", &record.event_name),
        string_attribute("tealium_profile", &record.tealium_profile),
    ];
    data_point.value = Some(number_data_point::Value::AsInt(1));

    let mut sum = Sum::default();
    sum.data_points = vec![data_point];
    sum.aggregation_temporality = AggregationTemporality::Delta as i32;
    sum.is_monotonic = true;

    let mut metric = Metric::default();
    metric.name = COUNTER_NAME.to_string();
    metric.data = Some(metric::Data::Sum(sum));

    let mut scope_metrics = ScopeMetrics::default();
    scope_metrics.metrics = vec![metric];

    let mut resource_metrics = ResourceMetrics::default();
    resource_metrics.scope_metrics = vec![scope_metrics];

    let mut request = ExportMetricsServiceRequest::default();
    request.resource_metrics = vec![resource_metrics];
    request
}

fn encode_request(request: &ExportMetricsServiceRequest) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    request.encode(&mut buf).map_err(|e| {
        let err = format!("failed to encode request: {}", e);
        error!("{}", err);
        err
    })?;
    Ok(buf)
}

/// Posts the encoded counter to the metrics backend.
pub async fn emit(config: &Config, record: &ErrorLogRecord) -> Result<(), Error> {
    let request = counter_request(record);
    debug!("error counter payload: {:?}", request);
    let body = encode_request(&request)?;

    let uri = format!("{}/v1/metrics", config.metrics_endpoint);
    let start = Instant::now();
    let bytes = body.len();
    let mut http_request = reqwest::Client::new()
        .post(&uri)
        .header("Content-Type", "application/x-protobuf")
        .body(body);
    if let Some(api_key) = &config.metrics_api_key {
        http_request = http_request.header("Authorization", format!("Bearer {}", api_key));
    }
    let response = http_request.send().await?;

    info!(
        status = %response.status(),
        bytes,
        elapsed_ms = start.elapsed().as_millis(),
        uri = %uri,
        "metrics HTTP request completed"
    );

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::RunContext;
    use chrono::{TimeZone, Utc};
    use serde_json::Value;

    #[test]
    fn test_counter_request_labels() {
        let ctx = RunContext::at(Utc.with_ymd_and_hms(2022, 9, 17, 8, 34, 18).unwrap());
        let record = ErrorLogRecord {
            log_id: "1-R220917-083418-000".to_string(),
            run_id: ctx.run_id.clone(),
            logged_at: ctx.received_at,
            expire_at: 0,
            event_name: "view__ecommerce__checkout_cart".to_string(),
            error_types: vec![],
            error_vars: vec![],
            user_id: "missing".to_string(),
            url_full: "url_full missing".to_string(),
            product_id: None,
            tealium_profile: "main".to_string(),
            data_layer: Value::Object(Default::default()),
            error_data: Value::Object(Default::default()),
        };

        let request = counter_request(&record);
        let metric = &request.resource_metrics[0].scope_metrics[0].metrics[0];
        assert_eq!(metric.name, COUNTER_NAME);

        let Some(metric::Data::Sum(sum)) = &metric.data else {
            panic!("counter is not a sum");
        };
        assert!(sum.is_monotonic);
        let point = &sum.data_points[0];
        assert_eq!(point.value, Some(number_data_point::Value::AsInt(1)));

        let label = |key: &str| -> &str {
            let value = point
                .attributes
                .iter()
                .find(|kv| kv.key == key)
                .and_then(|kv| kv.value.as_ref())
                .and_then(|v| v.value.as_ref())
                .expect("label present");
            match value {
                any_value::Value::StringValue(s) => s,
                other => panic!("unexpected label value: {:?}", other),
            }
        };
        assert_eq!(label("event_name"), "view__ecommerce__checkout_cart");
        assert_eq!(label("tealium_profile"), "main");
    }

    #[test]
    fn test_encode_request_round_trips() {
        let request = ExportMetricsServiceRequest::default();
        let body = encode_request(&request).unwrap();
        let decoded = ExportMetricsServiceRequest::decode(&*body).unwrap();
        assert_eq!(decoded, request);
    }
}
