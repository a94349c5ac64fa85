use aws_sdk_redshiftdata::types::SqlParameter;
use aws_sdk_redshiftdata::Client as RedshiftDataClient;
use lambda_runtime::Error;
use tracing::info;

use crate::config::Config;
use crate::errorlog::record::ErrorLogRecord;

/// One row of error metadata for the monitoring dashboard.
fn row_values(record: &ErrorLogRecord) -> Vec<(&'static str, String)> {
    vec![
        ("event_id", record.log_id.clone()),
        ("event_name", record.event_name.clone()),
        ("error_types", record.error_types.join(";")),
        ("error_vars", record.error_vars.join(";")),
        ("logged_at", record.logged_at.to_rfc3339()),
        ("url_full", record.url_full.clone()),
        ("user_id", record.user_id.clone()),
        ("tealium_profile", record.tealium_profile.clone()),
    ]
}

fn insert_sql(table: &str) -> String {
    format!(
        "INSERT INTO {} \
         (event_id, event_name, error_types, error_vars, logged_at, url_full, user_id, tealium_profile) \
         VALUES (:event_id, :event_name, :error_types, :error_vars, :logged_at, :url_full, :user_id, :tealium_profile)",
        table
    )
}

pub async fn insert(
    client: &RedshiftDataClient,
    config: &Config,
    record: &ErrorLogRecord,
) -> Result<(), Error> {
    let sql = insert_sql(&config.warehouse_table);
    let mut parameters = Vec::new();
    for (name, value) in row_values(record) {
        parameters.push(
            SqlParameter::builder()
                .name(name)
                .value(value)
                .build()
                .map_err(|e| format!("failed to build warehouse parameter {} - {}", name, e))?,
        );
    }

    client
        .execute_statement()
        .set_cluster_identifier(config.warehouse_cluster_id.clone())
        .database(&config.warehouse_database)
        .sql(&sql)
        .set_parameters(Some(parameters))
        .send()
        .await
        .map_err(|e| {
            format!(
                "failed to insert into warehouse table {} - {}",
                config.warehouse_table,
                e.into_service_error()
            )
        })?;

    info!(table = %config.warehouse_table, event_id = %record.log_id, "wrote error row to warehouse");
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::RunContext;
    use chrono::{TimeZone, Utc};
    use serde_json::Value;

    fn record() -> ErrorLogRecord {
        let ctx = RunContext::at(Utc.with_ymd_and_hms(2022, 9, 17, 8, 34, 18).unwrap());
        ErrorLogRecord {
            log_id: crate::errorlog::record::log_id(ctx.received_at, &ctx.run_id),
            run_id: ctx.run_id.clone(),
            logged_at: ctx.received_at,
            expire_at: ctx.received_at.timestamp() + 4 * 24 * 3600,
            event_name: "view__ecommerce__checkout_cart".to_string(),
            error_types: vec!["fullOrRegExMatch".to_string(), "populatedAndOfType".to_string()],
            error_vars: vec!["url_pathNoLang".to_string(), "page_type".to_string()],
            user_id: "017d0dad".to_string(),
            url_full: "https://www.somesite.ch/checkout/adresse".to_string(),
            product_id: Some("1419624".to_string()),
            tealium_profile: "main".to_string(),
            data_layer: Value::Object(Default::default()),
            error_data: Value::Object(Default::default()),
        }
    }

    #[test]
    fn test_row_values_joins_with_semicolons() {
        let values = row_values(&record());
        let lookup = |name: &str| -> &str {
            &values.iter().find(|(n, _)| *n == name).unwrap().1
        };
        assert_eq!(lookup("error_types"), "fullOrRegExMatch;populatedAndOfType");
        assert_eq!(lookup("error_vars"), "url_pathNoLang;page_type");
        assert_eq!(lookup("event_name"), "view__ecommerce__checkout_cart");
        assert_eq!(lookup("tealium_profile"), "main");
    }

    #[test]
    fn test_insert_sql_names_configured_table() {
        let sql = insert_sql("datalayer_errors.datalayer_error_logs");
        assert!(sql.starts_with("INSERT INTO datalayer_errors.datalayer_error_logs "));
        assert!(sql.contains(":event_id"));
        assert!(sql.contains(":tealium_profile"));
    }
}
