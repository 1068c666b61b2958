use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, Instrument};

use super::dynamodb::{
    dynamodb_span, get_decimal, get_u32, get_u64, id_value, map_dynamodb_error,
    number_value, parse_items, Item,
};
use super::id_sequence::{IdSequence, ORDER_ITEM_SEQUENCE, ORDER_SEQUENCE};
use crate::models::{Order, OrderItem, OrderStatus, RepositoryError, RepositoryResult};

/// Trait defining the interface for order data access operations
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Find every stored order
    async fn find_all(&self) -> RepositoryResult<Vec<Order>>;

    /// Find an order by its ID
    async fn find_by_id(&self, id: u64) -> RepositoryResult<Option<Order>>;

    /// Insert or replace an order, assigning ids to the order and its items when missing
    async fn save(&self, order: Order) -> RepositoryResult<Order>;
}

/// DynamoDB implementation of the OrderRepository trait
///
/// Items are embedded in the order record as a list of maps.
pub struct DynamoDbOrderRepository {
    client: Arc<DynamoDbClient>,
    ids: Arc<IdSequence>,
    table_name: String,
    region: String,
}

impl DynamoDbOrderRepository {
    pub fn new(
        client: Arc<DynamoDbClient>,
        ids: Arc<IdSequence>,
        table_name: String,
        region: String,
    ) -> Self {
        Self {
            client,
            ids,
            table_name,
            region,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Convert an Order to DynamoDB attribute values
    pub fn order_to_item(&self, order: &Order) -> RepositoryResult<Item> {
        let mut item = HashMap::new();

        item.insert("id".to_string(), id_value(order.id, "Order")?);
        item.insert(
            "status".to_string(),
            AttributeValue::S(order.status.to_string()),
        );
        item.insert("total".to_string(), number_value(order.total));
        if let Some(created_at) = order.created_at {
            item.insert(
                "created_at".to_string(),
                AttributeValue::S(created_at.to_rfc3339()),
            );
        }

        let mut items = Vec::with_capacity(order.items.len());
        for order_item in &order.items {
            let mut map = HashMap::new();
            map.insert("id".to_string(), id_value(order_item.id, "OrderItem")?);
            map.insert(
                "order_id".to_string(),
                id_value(order_item.order_id, "OrderItem order reference")?,
            );
            map.insert("product_id".to_string(), number_value(order_item.product_id));
            map.insert("quantity".to_string(), number_value(order_item.quantity));
            items.push(AttributeValue::M(map));
        }
        item.insert("items".to_string(), AttributeValue::L(items));

        Ok(item)
    }

    /// Convert a DynamoDB item to an Order
    pub fn item_to_order(&self, item: Item) -> RepositoryResult<Order> {
        let id = get_u64(&item, "id")?;

        let status = item
            .get("status")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| OrderStatus::from_str(s).ok())
            .unwrap_or_default();

        let total = get_decimal(&item, "total")?;

        let created_at = item
            .get("created_at")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let mut items = Vec::new();
        if let Some(list) = item.get("items").and_then(|v| v.as_l().ok()) {
            for value in list {
                let map = value.as_m().map_err(|_| RepositoryError::InvalidItem {
                    message: "Order item is not a map".to_string(),
                })?;
                items.push(OrderItem {
                    id: Some(get_u64(map, "id")?),
                    order_id: Some(get_u64(map, "order_id").unwrap_or(id)),
                    product_id: get_u64(map, "product_id")?,
                    quantity: get_u32(map, "quantity")?,
                });
            }
        }

        Ok(Order {
            id: Some(id),
            status,
            total,
            created_at,
            items,
        })
    }
}

#[async_trait]
impl OrderRepository for DynamoDbOrderRepository {
    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn find_all(&self) -> RepositoryResult<Vec<Order>> {
        info!("Scanning all orders");

        let mut orders = Vec::new();
        let mut start_key = None;

        loop {
            let span = dynamodb_span("Scan", &self.table_name, &self.region);
            let page = async {
                self.client
                    .scan()
                    .table_name(&self.table_name)
                    .set_exclusive_start_key(start_key.clone())
                    .send()
                    .await
                    .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
            }
            .instrument(span)
            .await?;

            orders.extend(parse_items(page.items, |item| self.item_to_order(item)));

            match page.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        info!("Found {} orders", orders.len());
        Ok(orders)
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn find_by_id(&self, id: u64) -> RepositoryResult<Option<Order>> {
        let span = dynamodb_span("GetItem", &self.table_name, &self.region);

        let response = async {
            self.client
                .get_item()
                .table_name(&self.table_name)
                .key("id", number_value(id))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(span)
        .await?;

        match response.item {
            Some(item) => Ok(Some(self.item_to_order(item)?)),
            None => {
                info!("Order not found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, order), fields(table = %self.table_name, id = ?order.id))]
    async fn save(&self, mut order: Order) -> RepositoryResult<Order> {
        if order.id.is_none() {
            let id = self.ids.next_id(ORDER_SEQUENCE).await?;
            order.assign_id(id);
        }
        if order.created_at.is_none() {
            order.created_at = Some(Utc::now());
        }
        for order_item in &mut order.items {
            if order_item.id.is_none() {
                order_item.id = Some(self.ids.next_id(ORDER_ITEM_SEQUENCE).await?);
            }
        }
        order.link_items();

        let item = self.order_to_item(&order)?;
        let span = dynamodb_span("PutItem", &self.table_name, &self.region);

        async {
            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(item))
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(span)
        .await?;

        info!("Order saved");
        Ok(order)
    }
}
