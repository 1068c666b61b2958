use std::sync::Arc;
use tracing::instrument;

use crate::models::{Order, Product, ProductImage, ServiceError, ServiceResult};
use crate::repositories::{OrderRepository, ProductImageRepository, ProductRepository};

/// Persistence facade shared by the order and product handlers
pub struct EcommerceService {
    orders: Arc<dyn OrderRepository>,
    products: Arc<dyn ProductRepository>,
    images: Arc<dyn ProductImageRepository>,
}

impl EcommerceService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        products: Arc<dyn ProductRepository>,
        images: Arc<dyn ProductImageRepository>,
    ) -> Self {
        Self {
            orders,
            products,
            images,
        }
    }

    #[instrument(skip(self))]
    pub async fn get_orders(&self) -> ServiceResult<Vec<Order>> {
        let orders = self.orders.find_all().await?;
        crate::info_with_trace!("Found {} orders", orders.len());
        Ok(orders)
    }

    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_order(&self, id: u64) -> ServiceResult<Option<Order>> {
        let order = self.orders.find_by_id(id).await?;
        if order.is_none() {
            crate::warn_with_trace!("Order not found");
        }
        Ok(order)
    }

    /// Persist an order. Items are linked to the order before they reach the
    /// repository and again once its id is known.
    #[instrument(skip(self, order), fields(id = ?order.id, items = order.items.len()))]
    pub async fn save_order(&self, mut order: Order) -> ServiceResult<Order> {
        order.link_items();

        let mut saved = self.orders.save(order).await?;
        saved.link_items();

        crate::info_with_trace!(order_id = ?saved.id, "Order saved");
        Ok(saved)
    }

    /// Create a new order, ignoring any identity sent by the client
    #[instrument(skip(self, order))]
    pub async fn create_order(&self, mut order: Order) -> ServiceResult<Order> {
        order.clear_ids();
        self.save_order(order).await
    }

    #[instrument(skip(self))]
    pub async fn get_products(&self) -> ServiceResult<Vec<Product>> {
        let products = self.products.find_all().await?;
        crate::info_with_trace!("Found {} products", products.len());
        Ok(products)
    }

    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_product(&self, id: u64) -> ServiceResult<Option<Product>> {
        let product = self.products.find_by_id(id).await?;
        if product.is_none() {
            crate::warn_with_trace!("Product not found");
        }
        Ok(product)
    }

    #[instrument(skip(self, product), fields(id = ?product.id, name = %product.name))]
    pub async fn save_product(&self, product: Product) -> ServiceResult<Product> {
        let saved = self.products.save(product).await?;
        crate::info_with_trace!(product_id = ?saved.id, "Product saved");
        Ok(saved)
    }

    /// Create a new product, ignoring any id sent by the client
    #[instrument(skip(self, product))]
    pub async fn create_product(&self, mut product: Product) -> ServiceResult<Product> {
        product.id = None;
        self.save_product(product).await
    }

    /// Register an uploaded file against a product and hand back its name
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_product_image(
        &self,
        product_id: u64,
        filename: String,
    ) -> ServiceResult<String> {
        self.require_product(product_id).await?;

        let image = self
            .images
            .create(ProductImage::new(product_id, filename))
            .await?;

        crate::info_with_trace!(image_id = ?image.id, "Product image registered");
        Ok(image.path)
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product_images(&self, product_id: u64) -> ServiceResult<Vec<ProductImage>> {
        Ok(self.images.find_by_product_id(product_id).await?)
    }

    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_product_image(&self, id: u64) -> ServiceResult<Option<ProductImage>> {
        let image = self.images.find_by_id(id).await?;
        if image.is_none() {
            crate::warn_with_trace!("Product image not found");
        }
        Ok(image)
    }

    /// Fail with `ProductNotFound` unless the product is stored
    pub async fn require_product(&self, product_id: u64) -> ServiceResult<Product> {
        self.products
            .find_by_id(product_id)
            .await?
            .ok_or(ServiceError::ProductNotFound { id: product_id })
    }
}
