use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, Instrument};

use super::dynamodb::{
    dynamodb_span, get_decimal, get_string, get_u64, id_value, map_dynamodb_error, number_value,
    parse_items, Item,
};
use super::id_sequence::{IdSequence, PRODUCT_SEQUENCE};
use crate::models::{Product, RepositoryResult};

/// Trait defining the interface for product data access operations
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Find every stored product
    async fn find_all(&self) -> RepositoryResult<Vec<Product>>;

    /// Find a product by its ID
    async fn find_by_id(&self, id: u64) -> RepositoryResult<Option<Product>>;

    /// Insert or replace a product, assigning an id when missing
    async fn save(&self, product: Product) -> RepositoryResult<Product>;
}

/// DynamoDB implementation of the ProductRepository trait
pub struct DynamoDbProductRepository {
    client: Arc<DynamoDbClient>,
    ids: Arc<IdSequence>,
    table_name: String,
    region: String,
}

impl DynamoDbProductRepository {
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

    /// Convert a Product to DynamoDB attribute values
    pub fn product_to_item(&self, product: &Product) -> RepositoryResult<Item> {
        let mut item = HashMap::new();

        item.insert("id".to_string(), id_value(product.id, "Product")?);
        item.insert("name".to_string(), AttributeValue::S(product.name.clone()));
        item.insert("price".to_string(), number_value(product.price));
        item.insert(
            "description".to_string(),
            AttributeValue::S(product.description.clone()),
        );
        // Attribute name avoids the reserved word GROUP in expressions
        item.insert(
            "product_group".to_string(),
            AttributeValue::S(product.group.clone()),
        );

        Ok(item)
    }

    /// Convert a DynamoDB item to a Product
    pub fn item_to_product(&self, item: Item) -> RepositoryResult<Product> {
        Ok(Product {
            id: Some(get_u64(&item, "id")?),
            name: get_string(&item, "name")?,
            price: get_decimal(&item, "price")?,
            description: get_string(&item, "description").unwrap_or_default(),
            group: get_string(&item, "product_group").unwrap_or_default(),
        })
    }
}

#[async_trait]
impl ProductRepository for DynamoDbProductRepository {
    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn find_all(&self) -> RepositoryResult<Vec<Product>> {
        info!("Scanning all products");

        let mut products = Vec::new();
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

            products.extend(parse_items(page.items, |item| self.item_to_product(item)));

            match page.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        info!("Found {} products", products.len());
        Ok(products)
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn find_by_id(&self, id: u64) -> RepositoryResult<Option<Product>> {
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
            Some(item) => Ok(Some(self.item_to_product(item)?)),
            None => {
                info!("Product not found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, product), fields(table = %self.table_name, id = ?product.id))]
    async fn save(&self, mut product: Product) -> RepositoryResult<Product> {
        if product.id.is_none() {
            product.id = Some(self.ids.next_id(PRODUCT_SEQUENCE).await?);
        }

        let item = self.product_to_item(&product)?;
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

        info!("Product saved");
        Ok(product)
    }
}
