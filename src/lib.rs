use aws_lambda_events::encodings::Body;
use aws_lambda_events::event::apigw::{ApiGatewayV2httpRequest, ApiGatewayV2httpResponse};
use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use lambda_runtime::{Error, LambdaEvent};
use serde_json::json;
use tracing::level_filters::LevelFilter;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::auth::TokenValidator;
use crate::clients::AwsClients;
use crate::config::Config;
use crate::context::RunContext;
use crate::events::CollectorRequest;
use crate::store::DynDocumentStore;

pub mod auth;
pub mod clients;
pub mod config;
pub mod context;
pub mod errorlog;
pub mod eventmap;
pub mod events;
pub mod store;

pub fn set_up_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .init();
}

fn json_response(status_code: i64, body: serde_json::Value) -> ApiGatewayV2httpResponse {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    ApiGatewayV2httpResponse {
        status_code,
        headers,
        body: Some(Body::Text(body.to_string())),
        ..Default::default()
    }
}

// lambda handler
pub async fn function_handler(
    clients: &AwsClients,
    store: DynDocumentStore,
    validator: &TokenValidator,
    config: &Config,
    event: LambdaEvent<ApiGatewayV2httpRequest>,
) -> Result<ApiGatewayV2httpResponse, Error> {
    info!("Handling lambda invocation");
    debug!("Handling request: {:?}", event.payload);

    let request = event.payload;

    // lightweight liveness route, no validation
    if request
        .raw_path
        .as_deref()
        .is_some_and(|p| p.ends_with("/test_me"))
    {
        return Ok(json_response(
            200,
            json!({"message": "test_me ran successfully"}),
        ));
    }

    let body: CollectorRequest = match request
        .body
        .as_deref()
        .ok_or_else(|| "empty body".to_string())
        .and_then(|b| serde_json::from_str(b).map_err(|e| e.to_string()))
    {
        Ok(body) => body,
        Err(err) => {
            info!(error = %err, "failed to decode request body");
            return Ok(json_response(
                400,
                json!({"message": "Request body is not valid JSON"}),
            ));
        }
    };

    // fresh per request; a warm execution environment must never reuse the
    // previous invocation's run id
    let ctx = RunContext::new();

    let payload = match body.decode_event_payload() {
        Ok(payload) => payload,
        Err(err) => {
            info!(run_id = %ctx.run_id, error = %err, "failed to decode event payload");
            return Ok(json_response(400, json!({"message": err.to_string()})));
        }
    };

    info!(
        run_id = %ctx.run_id,
        script = payload.script.as_deref().unwrap_or("unset"),
        script_type = payload.script_type.as_deref().unwrap_or("unset"),
        "received request"
    );

    let Some(token) = body.token.as_deref() else {
        info!(run_id = %ctx.run_id, "request has no token field");
        return Ok(json_response(401, json!({})));
    };
    if !validator.validate(Some(token)) {
        info!(run_id = %ctx.run_id, "Secret is incorrect");
        return Ok(json_response(401, json!({"message": "Secret is incorrect"})));
    }

    match payload.script.as_deref() {
        Some("log_datalayer_error") => {
            errorlog::process(&payload, &ctx, &store, clients, config).await?;
            info!(run_id = %ctx.run_id, "Logged Error Successfully");
        }
        Some("update_event_map") => {
            eventmap::process(&payload, &ctx, &clients.s3, config).await?;
            info!(run_id = %ctx.run_id, "update_event_map ran successfully");
        }
        // unmatched scripts fall through without dispatching; the sending
        // platform treats this endpoint as fire-and-forget
        other => {
            info!(
                run_id = %ctx.run_id,
                script = other.unwrap_or("unset"),
                "no operation matches the requested script"
            );
        }
    }

    Ok(json_response(200, json!({"message": "Secret is correct"})))
}
