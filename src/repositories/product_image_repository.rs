use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, Instrument};

use super::dynamodb::{
    dynamodb_span, get_string, get_u64, id_value, map_dynamodb_error, number_value, parse_items,
    Item,
};
use super::id_sequence::{IdSequence, PRODUCT_IMAGE_SEQUENCE};
use crate::models::{ProductImage, RepositoryResult};

/// Name of the global secondary index keyed on `product_id`
pub const PRODUCT_ID_INDEX: &str = "ProductIdIndex";

/// Trait defining the interface for product image records
#[async_trait]
pub trait ProductImageRepository: Send + Sync {
    /// Find every image whose product id matches
    async fn find_by_product_id(&self, product_id: u64) -> RepositoryResult<Vec<ProductImage>>;

    /// Find an image by its ID
    async fn find_by_id(&self, id: u64) -> RepositoryResult<Option<ProductImage>>;

    /// Store a new image record, assigning its id
    async fn create(&self, image: ProductImage) -> RepositoryResult<ProductImage>;
}

/// DynamoDB implementation of the ProductImageRepository trait
pub struct DynamoDbProductImageRepository {
    client: Arc<DynamoDbClient>,
    ids: Arc<IdSequence>,
    table_name: String,
    product_id_index: String,
    region: String,
}

impl DynamoDbProductImageRepository {
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
            product_id_index: PRODUCT_ID_INDEX.to_string(),
            region,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn product_id_index(&self) -> &str {
        &self.product_id_index
    }

    /// Convert a ProductImage to DynamoDB attribute values
    pub fn image_to_item(&self, image: &ProductImage) -> RepositoryResult<Item> {
        let mut item = HashMap::new();

        item.insert("id".to_string(), id_value(image.id, "ProductImage")?);
        item.insert("product_id".to_string(), number_value(image.product_id));
        item.insert("path".to_string(), AttributeValue::S(image.path.clone()));

        Ok(item)
    }

    /// Convert a DynamoDB item to a ProductImage
    pub fn item_to_image(&self, item: Item) -> RepositoryResult<ProductImage> {
        Ok(ProductImage {
            id: Some(get_u64(&item, "id")?),
            product_id: get_u64(&item, "product_id")?,
            path: get_string(&item, "path")?,
        })
    }
}

#[async_trait]
impl ProductImageRepository for DynamoDbProductImageRepository {
    #[instrument(skip(self), fields(table = %self.table_name, product_id = %product_id))]
    async fn find_by_product_id(&self, product_id: u64) -> RepositoryResult<Vec<ProductImage>> {
        info!("Querying images by product id using GSI");

        let mut images = Vec::new();
        let mut start_key = None;

        loop {
            let span = dynamodb_span("Query", &self.table_name, &self.region);
            let page = async {
                self.client
                    .query()
                    .table_name(&self.table_name)
                    .index_name(&self.product_id_index)
                    .key_condition_expression("product_id = :product_id")
                    .expression_attribute_values(":product_id", number_value(product_id))
                    .set_exclusive_start_key(start_key.clone())
                    .send()
                    .await
                    .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
            }
            .instrument(span)
            .await?;

            images.extend(parse_items(page.items, |item| self.item_to_image(item)));

            match page.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        images.sort_by_key(|image| image.id);

        info!("Found {} images for product {}", images.len(), product_id);
        Ok(images)
    }

    #[instrument(skip(self), fields(table = %self.table_name, id = %id))]
    async fn find_by_id(&self, id: u64) -> RepositoryResult<Option<ProductImage>> {
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
            Some(item) => Ok(Some(self.item_to_image(item)?)),
            None => {
                info!("Product image not found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, image), fields(table = %self.table_name, product_id = %image.product_id))]
    async fn create(&self, mut image: ProductImage) -> RepositoryResult<ProductImage> {
        image.id = Some(self.ids.next_id(PRODUCT_IMAGE_SEQUENCE).await?);

        let item = self.image_to_item(&image)?;
        let span = dynamodb_span("PutItem", &self.table_name, &self.region);

        async {
            self.client
                .put_item()
                .table_name(&self.table_name)
                .set_item(Some(item))
                .condition_expression("attribute_not_exists(id)")
                .send()
                .await
                .map_err(|e| map_dynamodb_error(&self.table_name, e.into()))
        }
        .instrument(span)
        .await?;

        info!("Product image registered");
        Ok(image)
    }
}
