use lambda_runtime::Error;
use tracing::info;

use crate::clients::AwsClients;
use crate::config::Config;
use crate::context::RunContext;
use crate::events::EventPayload;
use crate::store::DynDocumentStore;

pub mod metrics;
pub mod normalize;
pub mod record;
pub mod warehouse;

use record::ErrorLogRecord;

/// Logs a data layer error event: normalizes the payload, writes one document
/// to the error-log store, and fans the metadata out to the warehouse and the
/// metrics backend when those integrations are enabled. A failure anywhere
/// leaves earlier writes in place; there is no compensation.
pub async fn process(
    payload: &EventPayload,
    ctx: &RunContext,
    store: &DynDocumentStore,
    clients: &AwsClients,
    config: &Config,
) -> Result<(), Error> {
    info!(run_id = %ctx.run_id, "starting data layer error logging");

    let normalized = normalize::normalize(payload, &config.fields);
    let record = ErrorLogRecord::build(payload, &normalized, ctx, config.retention_days);

    info!(
        run_id = %ctx.run_id,
        log_id = %record.log_id,
        event = %record.event_name,
        url = %record.url_full,
        user_id = %record.user_id,
        "{}",
        normalized.summary.trim_end()
    );

    store.put(&record).await?;

    if config.warehouse_enabled {
        warehouse::insert(&clients.redshift, config, &record).await?;
    }

    if config.metrics_enabled {
        metrics::emit(config, &record).await?;
    }

    Ok(())
}
