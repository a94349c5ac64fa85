use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use thiserror::Error;
use tracing::info;

use crate::errorlog::record::ErrorLogRecord;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to write document {log_id} to table {table} - {message}")]
    Put {
        table: String,
        log_id: String,
        message: String,
    },
}

/// Seam over the error-log document store so the handler can be driven with a
/// test double instead of a live DynamoDB table.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn put(&self, record: &ErrorLogRecord) -> Result<(), StoreError>;
}

pub type DynDocumentStore = Arc<dyn DocumentStore>;

/// Writes error-log documents to a DynamoDB table keyed by `logId`. The
/// table's TTL policy on `expireAt` handles deletion.
pub struct DynamoDocumentStore {
    client: DynamoDbClient,
    table: String,
}

impl DynamoDocumentStore {
    pub fn new(client: DynamoDbClient, table: String) -> Self {
        DynamoDocumentStore { client, table }
    }
}

#[async_trait]
impl DocumentStore for DynamoDocumentStore {
    async fn put(&self, record: &ErrorLogRecord) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(record.to_item()))
            .send()
            .await
            .map_err(|e| StoreError::Put {
                table: self.table.clone(),
                log_id: record.log_id.clone(),
                message: e.into_service_error().to_string(),
            })?;

        info!(
            table = %self.table,
            log_id = %record.log_id,
            "stored data layer and error data"
        );
        Ok(())
    }
}
