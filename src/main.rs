use std::sync::Arc;

use aws_config::BehaviorVersion;
use aws_lambda_events::event::apigw::ApiGatewayV2httpRequest;
use datalayer_collector::auth::TokenValidator;
use datalayer_collector::clients::AwsClients;
use datalayer_collector::config;
use datalayer_collector::store::{DynDocumentStore, DynamoDocumentStore};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    datalayer_collector::set_up_logging();

    info!(
        "Initializing {} version {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let aws_config = aws_config::load_defaults(BehaviorVersion::v2023_11_09()).await;
    let clients = AwsClients::new(&aws_config);
    let mut config = config::Config::load_from_env()?;

    // if the token provided is an ARN, get the token from Secrets Manager
    if config.token.starts_with("arn:aws:secretsmanager:") {
        config.token = config::get_token_from_secrets_manager(&aws_config, config.token.clone())
            .await
            .map_err(|e| e.to_string())?;
    };

    let validator = TokenValidator::new(config.token.clone());
    let store: DynDocumentStore = Arc::new(DynamoDocumentStore::new(
        clients.dynamodb.clone(),
        config.error_log_table.clone(),
    ));

    run(service_fn(|request: LambdaEvent<ApiGatewayV2httpRequest>| {
        datalayer_collector::function_handler(&clients, store.clone(), &validator, &config, request)
    }))
    .await
}
