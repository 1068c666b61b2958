use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::sync::Arc;
use tracing::{debug, instrument, Instrument};

use super::dynamodb::{dynamodb_span, get_u64, map_dynamodb_error};
use crate::models::{RepositoryError, RepositoryResult};

pub const ORDER_SEQUENCE: &str = "order";
pub const ORDER_ITEM_SEQUENCE: &str = "order_item";
pub const PRODUCT_SEQUENCE: &str = "product";
pub const PRODUCT_IMAGE_SEQUENCE: &str = "product_image";

/// Numeric id allocation backed by atomic counters in a DynamoDB table
pub struct IdSequence {
    client: Arc<DynamoDbClient>,
    table_name: String,
    region: String,
}

impl IdSequence {
    pub fn new(client: Arc<DynamoDbClient>, table_name: String, region: String) -> Self {
        Self {
            client,
            table_name,
            region,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Increment the named counter and return its new value
    #[instrument(skip(self), fields(table = %self.table_name))]
    pub async fn next_id(&self, sequence: &str) -> RepositoryResult<u64> {
        let span = dynamodb_span("UpdateItem", &self.table_name, &self.region);

        let output = async {
            self.client
                .update_item()
                .table_name(&self.table_name)
                .key("name", AttributeValue::S(sequence.to_string()))
                .update_expression("ADD current_value :one")
                .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
                .return_values(ReturnValue::UpdatedNew)
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(span)
        .await?;

        let attributes = output
            .attributes
            .ok_or_else(|| RepositoryError::InvalidItem {
                message: format!("Counter {} returned no attributes", sequence),
            })?;

        let id = get_u64(&attributes, "current_value")?;
        debug!(sequence, id, "Allocated id");
        Ok(id)
    }
}
