use std::env;
use std::string::String;

use aws_config::SdkConfig;
use aws_sdk_secretsmanager::operation::get_secret_value::GetSecretValueError;

/// Data layer keys the collector reads from incoming payloads. These vary per
/// deployment (different sites use different UDO variable names), so they are
/// configuration rather than constants.
#[derive(Debug, Clone)]
pub struct FieldNames {
    pub user_id: String,
    pub product_id: String,
    pub url: String,
    pub profile: String,
}

#[derive(Debug)]
pub struct Config {
    pub token: String,
    pub error_log_table: String,
    pub default_bucket: String,
    pub event_map_bucket: String,
    pub event_map_key: String,
    pub retention_days: i64,
    pub warehouse_enabled: bool,
    pub warehouse_table: String,
    pub warehouse_cluster_id: Option<String>,
    pub warehouse_database: String,
    pub metrics_enabled: bool,
    pub metrics_endpoint: String,
    pub metrics_api_key: Option<String>,
    pub fields: FieldNames,
}

impl Config {
    pub fn load_from_env() -> Result<Config, String> {
        let conf = Config {
            token: env::var("COLLECTOR_TOKEN")
                .map_err(|e| format!("COLLECTOR_TOKEN not set - {}", e))?,
            error_log_table: env::var("ERROR_LOG_TABLE")
                .unwrap_or_else(|_| "datalayer_error_logs".to_string()),
            default_bucket: env::var("DEFAULT_BUCKET").unwrap_or_default(),
            event_map_bucket: env::var("EVENT_MAP_BUCKET")
                .map_err(|e| format!("EVENT_MAP_BUCKET not set - {}", e))?,
            event_map_key: env::var("EVENT_MAP_KEY")
                .unwrap_or_else(|_| "automated_tests/eventMap.js".to_string()),
            retention_days: env::var("RETENTION_DAYS")
                .unwrap_or_else(|_| "4".to_string())
                .parse::<i64>()
                .map_err(|e| format!("Error parsing RETENTION_DAYS to i64 - {}", e))?,
            warehouse_enabled: flag_from_env("WAREHOUSE_ENABLED"),
            warehouse_table: env::var("WAREHOUSE_TABLE")
                .unwrap_or_else(|_| "datalayer_errors.datalayer_error_logs".to_string()),
            warehouse_cluster_id: env::var("WAREHOUSE_CLUSTER_ID").ok(),
            warehouse_database: env::var("WAREHOUSE_DATABASE")
                .unwrap_or_else(|_| "analytics".to_string()),
            metrics_enabled: flag_from_env("METRICS_ENABLED"),
            metrics_endpoint: env::var("METRICS_ENDPOINT")
                .unwrap_or_else(|_| "https://localhost:4318".to_string()),
            metrics_api_key: env::var("METRICS_API_KEY").ok(),
            fields: FieldNames {
                user_id: env::var("USER_ID_FIELD")
                    .unwrap_or_else(|_| "tealium_visitor_id".to_string()),
                product_id: env::var("PRODUCT_ID_FIELD").unwrap_or_else(|_| "prod_id".to_string()),
                url: env::var("URL_FIELD").unwrap_or_else(|_| "url_full".to_string()),
                profile: env::var("PROFILE_FIELD")
                    .unwrap_or_else(|_| "tealium_profile".to_string()),
            },
        };

        Ok(conf)
    }
}

fn flag_from_env(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

#[derive(thiserror::Error, Debug)]
pub enum TokenSourceError {
    #[error("Failed to access AWS Secrets Manager. Please make sure the lambda function has permissions to access the {secret_id} secret. Error: {error:?}")]
    FailedToAccessSecretsManager {
        secret_id: String,
        error: GetSecretValueError,
    },
    #[error("Didn't find the {secret_id} secret in AWS secretsmanager")]
    MissingSecret { secret_id: String },
}

/// Resolves the shared webhook secret from Secrets Manager. Used when
/// `COLLECTOR_TOKEN` holds a secret ARN instead of the literal token.
pub async fn get_token_from_secrets_manager(
    aws_config: &SdkConfig,
    secret_id: String,
) -> Result<String, TokenSourceError> {
    let secretsmanager = aws_sdk_secretsmanager::Client::new(aws_config);
    let response = secretsmanager
        .get_secret_value()
        .set_secret_id(Some(secret_id.clone()))
        .send()
        .await
        .map_err(|error| TokenSourceError::FailedToAccessSecretsManager {
            secret_id: secret_id.clone(),
            error: error.into_service_error(),
        })?;
    response
        .secret_string
        .ok_or(TokenSourceError::MissingSecret { secret_id })
}
