// Services module - business logic layer

pub mod ecommerce_service;
pub mod storage_service;

pub use ecommerce_service::EcommerceService;
pub use storage_service::{FileSystemStorage, StorageService, StoredResource};
