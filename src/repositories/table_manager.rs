use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, GlobalSecondaryIndex, KeySchemaElement, KeyType,
    Projection, ProjectionType, ScalarAttributeType, TableStatus,
};
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use super::dynamodb::map_dynamodb_error;
use super::product_image_repository::PRODUCT_ID_INDEX;
use crate::models::{RepositoryError, RepositoryResult};

/// Names of every table the service reads or writes
#[derive(Debug, Clone)]
pub struct TableNames {
    pub orders: String,
    pub products: String,
    pub product_images: String,
    pub counters: String,
}

/// Manages DynamoDB table creation
pub struct TableManager {
    client: Arc<DynamoDbClient>,
    poll_interval: Duration,
    max_attempts: u32,
}

impl TableManager {
    pub fn new(client: Arc<DynamoDbClient>) -> Self {
        Self {
            client,
            poll_interval: Duration::from_secs(2),
            max_attempts: 60,
        }
    }

    /// Create any missing table
    #[instrument(skip(self))]
    pub async fn create_all_tables(&self, tables: &TableNames) -> RepositoryResult<()> {
        info!("Ensuring all tables exist");

        let (orders, products, images, counters) = tokio::join!(
            self.create_table(&tables.orders, "id", ScalarAttributeType::N, None),
            self.create_table(&tables.products, "id", ScalarAttributeType::N, None),
            self.create_table(
                &tables.product_images,
                "id",
                ScalarAttributeType::N,
                Some(("product_id", PRODUCT_ID_INDEX)),
            ),
            self.create_table(&tables.counters, "name", ScalarAttributeType::S, None),
        );

        orders?;
        products?;
        images?;
        counters?;

        info!("All tables are ready");
        Ok(())
    }

    /// Create a pay-per-request table keyed on a single hash attribute,
    /// optionally with a numeric GSI
    #[instrument(skip(self, key_type, index), fields(table_name = %table_name))]
    pub async fn create_table(
        &self,
        table_name: &str,
        hash_key: &str,
        key_type: ScalarAttributeType,
        index: Option<(&str, &str)>,
    ) -> RepositoryResult<()> {
        if self.table_exists(table_name).await? {
            info!("Table {} already exists", table_name);
            return Ok(());
        }

        let mut attribute_definitions = vec![attribute(hash_key, key_type)?];
        let mut request = self
            .client
            .create_table()
            .table_name(table_name)
            .key_schema(hash_key_schema(hash_key)?)
            .billing_mode(BillingMode::PayPerRequest);

        if let Some((index_key, index_name)) = index {
            attribute_definitions.push(attribute(index_key, ScalarAttributeType::N)?);

            let gsi = GlobalSecondaryIndex::builder()
                .index_name(index_name)
                .key_schema(hash_key_schema(index_key)?)
                .projection(
                    Projection::builder()
                        .projection_type(ProjectionType::All)
                        .build(),
                )
                .build()
                .map_err(|e| RepositoryError::AwsSdk {
                    message: format!("Failed to build GSI: {}", e),
                })?;
            request = request.global_secondary_indexes(gsi);
        }

        request
            .set_attribute_definitions(Some(attribute_definitions))
            .send()
            .await
            .map_err(|e| map_dynamodb_error(table_name, e.into()))?;

        info!("Table creation initiated, waiting for table to become active");
        self.wait_for_table_active(table_name).await
    }

    /// Check if a table exists
    #[instrument(skip(self), fields(table_name = %table_name))]
    pub async fn table_exists(&self, table_name: &str) -> RepositoryResult<bool> {
        match self.client.describe_table().table_name(table_name).send().await {
            Ok(_) => Ok(true),
            Err(e) => {
                let is_missing = e
                    .as_service_error()
                    .map(|err| err.is_resource_not_found_exception())
                    .unwrap_or(false);

                if is_missing {
                    info!("Table {} does not exist", table_name);
                    Ok(false)
                } else {
                    error!("Error checking table existence: {}", e);
                    Err(RepositoryError::ConnectionFailed)
                }
            }
        }
    }

    #[instrument(skip(self), fields(table_name = %table_name))]
    async fn wait_for_table_active(&self, table_name: &str) -> RepositoryResult<()> {
        for _ in 0..self.max_attempts {
            let response = self
                .client
                .describe_table()
                .table_name(table_name)
                .send()
                .await
                .map_err(|e| map_dynamodb_error(table_name, e.into()))?;

            match response.table.and_then(|table| table.table_status) {
                Some(TableStatus::Active) => {
                    info!("Table {} is now active", table_name);
                    return Ok(());
                }
                Some(status) => info!("Table {} status: {:?}, waiting...", table_name, status),
                None => warn!("Table {} status unknown, waiting...", table_name),
            }

            tokio::time::sleep(self.poll_interval).await;
        }

        error!("Timeout waiting for table {} to become active", table_name);
        Err(RepositoryError::Timeout)
    }
}

fn attribute(name: &str, kind: ScalarAttributeType) -> RepositoryResult<AttributeDefinition> {
    AttributeDefinition::builder()
        .attribute_name(name)
        .attribute_type(kind)
        .build()
        .map_err(|e| RepositoryError::AwsSdk {
            message: format!("Failed to build attribute definition: {}", e),
        })
}

fn hash_key_schema(name: &str) -> RepositoryResult<KeySchemaElement> {
    KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(KeyType::Hash)
        .build()
        .map_err(|e| RepositoryError::AwsSdk {
            message: format!("Failed to build key schema: {}", e),
        })
}
