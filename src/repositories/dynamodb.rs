//! Shared helpers for the DynamoDB backed repositories.

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Error as DynamoDbError;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::error;

use crate::models::{RepositoryError, RepositoryResult};

pub type Item = HashMap<String, AttributeValue>;

/// Create a DynamoDB client span carrying X-Ray and OpenTelemetry attributes
pub fn dynamodb_span(operation: &str, table_name: &str, region: &str) -> tracing::Span {
    tracing::info_span!(
        "DynamoDB",
        "aws.service" = "DynamoDB",
        "aws.operation" = operation,
        "aws.region" = %region,
        "aws.dynamodb.table_name" = %table_name,
        "aws.request_id" = tracing::field::Empty,
        "aws.remote.service" = "AWS::DynamoDB",
        "aws.remote.operation" = operation,
        "aws.remote.resource.type" = "AWS::DynamoDB::Table",
        "aws.remote.resource.identifier" = %table_name,
        "otel.kind" = "client",
        "otel.name" = format!("DynamoDB.{}", operation),
        "rpc.system" = "aws-api",
        "rpc.service" = "AmazonDynamoDBv2",
        "rpc.method" = operation,
        "db.system" = "dynamodb",
        "db.name" = %table_name,
        "db.operation" = operation,
        "component" = "aws-sdk-dynamodb",
    )
}

/// Convert DynamoDB error to RepositoryError
pub fn map_dynamodb_error(table_name: &str, error: DynamoDbError) -> RepositoryError {
    error!("DynamoDB error: {:?}", error);

    match error {
        DynamoDbError::ResourceNotFoundException(_) => RepositoryError::TableNotFound {
            table_name: table_name.to_string(),
        },
        other => RepositoryError::AwsSdk {
            message: other.to_string(),
        },
    }
}

pub fn number_value(value: impl ToString) -> AttributeValue {
    AttributeValue::N(value.to_string())
}

pub fn id_value(id: Option<u64>, entity: &str) -> RepositoryResult<AttributeValue> {
    id.map(number_value).ok_or_else(|| RepositoryError::InvalidItem {
        message: format!("{} has no id assigned", entity),
    })
}

pub fn get_string(item: &Item, key: &str) -> RepositoryResult<String> {
    item.get(key)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| RepositoryError::InvalidItem {
            message: format!("Missing {}", key),
        })
}

pub fn get_u64(item: &Item, key: &str) -> RepositoryResult<u64> {
    item.get(key)
        .and_then(|v| v.as_n().ok())
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| RepositoryError::InvalidItem {
            message: format!("Invalid {}", key),
        })
}

pub fn get_u32(item: &Item, key: &str) -> RepositoryResult<u32> {
    item.get(key)
        .and_then(|v| v.as_n().ok())
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| RepositoryError::InvalidItem {
            message: format!("Invalid {}", key),
        })
}

pub fn get_decimal(item: &Item, key: &str) -> RepositoryResult<Decimal> {
    item.get(key)
        .and_then(|v| v.as_n().ok())
        .and_then(|s| Decimal::from_str(s).ok())
        .ok_or_else(|| RepositoryError::InvalidItem {
            message: format!("Invalid {}", key),
        })
}

/// Parse a page of raw items, skipping (and logging) the ones that do not convert
pub fn parse_items<T>(
    items: Option<Vec<Item>>,
    convert: impl Fn(Item) -> RepositoryResult<T>,
) -> Vec<T> {
    let mut parsed = Vec::new();
    for item in items.unwrap_or_default() {
        match convert(item) {
            Ok(value) => parsed.push(value),
            Err(e) => {
                tracing::warn!("Failed to parse item: {}", e);
            }
        }
    }
    parsed
}
