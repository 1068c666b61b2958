#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use tokio::net::TcpListener;
use uuid::Uuid;

use ecommerce_rs::handlers::{create_app, ApiState, RequestLimits, RouterSettings};
use ecommerce_rs::models::{Order, Product, ProductImage, RepositoryResult};
use ecommerce_rs::observability::Metrics;
use ecommerce_rs::repositories::{OrderRepository, ProductImageRepository, ProductRepository};
use ecommerce_rs::services::{EcommerceService, FileSystemStorage};

pub const PUBLIC_BASE_URL: &str = "http://shop.test";

/// Counter shared by the in-memory repositories, mirroring the counters table
#[derive(Default)]
pub struct Sequence(AtomicU64);

impl Sequence {
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: Mutex<BTreeMap<u64, Order>>,
    order_ids: Sequence,
    item_ids: Sequence,
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn find_all(&self) -> RepositoryResult<Vec<Order>> {
        Ok(self.orders.lock().unwrap().values().cloned().collect())
    }

    async fn find_by_id(&self, id: u64) -> RepositoryResult<Option<Order>> {
        Ok(self.orders.lock().unwrap().get(&id).cloned())
    }

    async fn save(&self, mut order: Order) -> RepositoryResult<Order> {
        let id = order.id.unwrap_or_else(|| self.order_ids.next());
        order.assign_id(id);
        order.created_at.get_or_insert_with(Utc::now);
        for item in &mut order.items {
            if item.id.is_none() {
                item.id = Some(self.item_ids.next());
            }
        }

        self.orders.lock().unwrap().insert(id, order.clone());
        Ok(order)
    }
}

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: Mutex<BTreeMap<u64, Product>>,
    ids: Sequence,
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_all(&self) -> RepositoryResult<Vec<Product>> {
        Ok(self.products.lock().unwrap().values().cloned().collect())
    }

    async fn find_by_id(&self, id: u64) -> RepositoryResult<Option<Product>> {
        Ok(self.products.lock().unwrap().get(&id).cloned())
    }

    async fn save(&self, mut product: Product) -> RepositoryResult<Product> {
        let id = *product.id.get_or_insert_with(|| self.ids.next());
        self.products.lock().unwrap().insert(id, product.clone());
        Ok(product)
    }
}

impl InMemoryProductRepository {
    /// Insert a product under a fixed id
    pub fn insert(&self, product: Product) {
        if let Some(id) = product.id {
            self.products.lock().unwrap().insert(id, product);
        }
    }
}

#[derive(Default)]
pub struct InMemoryProductImageRepository {
    images: Mutex<BTreeMap<u64, ProductImage>>,
    ids: Sequence,
}

#[async_trait]
impl ProductImageRepository for InMemoryProductImageRepository {
    async fn find_by_product_id(&self, product_id: u64) -> RepositoryResult<Vec<ProductImage>> {
        Ok(self
            .images
            .lock()
            .unwrap()
            .values()
            .filter(|image| image.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: u64) -> RepositoryResult<Option<ProductImage>> {
        Ok(self.images.lock().unwrap().get(&id).cloned())
    }

    async fn create(&self, mut image: ProductImage) -> RepositoryResult<ProductImage> {
        let id = self.ids.next();
        image.id = Some(id);
        self.images.lock().unwrap().insert(id, image.clone());
        Ok(image)
    }
}

pub struct TestEnvironment {
    pub client: Client,
    pub base_url: String,
    pub products: Arc<InMemoryProductRepository>,
    pub storage_root: PathBuf,
}

impl TestEnvironment {
    pub async fn new() -> Self {
        let products = Arc::new(InMemoryProductRepository::default());
        let service = Arc::new(EcommerceService::new(
            Arc::new(InMemoryOrderRepository::default()),
            products.clone(),
            Arc::new(InMemoryProductImageRepository::default()),
        ));

        let storage_root = std::env::temp_dir().join(format!("ecommerce-it-{}", Uuid::new_v4()));
        let storage = FileSystemStorage::new(storage_root.clone());
        storage.init().await.expect("Failed to create storage root");

        let metrics = Arc::new(Metrics::new().expect("Failed to create metrics"));
        let state = ApiState::new(
            service,
            Arc::new(storage),
            PUBLIC_BASE_URL.to_string(),
            metrics.clone(),
        );

        let app = create_app(
            state,
            metrics,
            RouterSettings {
                limits: RequestLimits {
                    max_request_size: 64 * 1024,
                    max_upload_size: 1024 * 1024,
                },
                request_timeout: Duration::from_secs(10),
            },
        );

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let addr = listener.local_addr().expect("Failed to get local address");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Failed to serve app");
        });

        Self {
            client: Client::new(),
            base_url,
            products,
            storage_root,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestEnvironment {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.storage_root);
    }
}
