// Repositories module - data access layer

pub mod dynamodb;
pub mod id_sequence;
pub mod order_repository;
pub mod product_image_repository;
pub mod product_repository;
pub mod table_manager;

#[cfg(test)]
mod tests;

pub use id_sequence::IdSequence;
pub use order_repository::{DynamoDbOrderRepository, OrderRepository};
pub use product_image_repository::{DynamoDbProductImageRepository, ProductImageRepository};
pub use product_repository::{DynamoDbProductRepository, ProductRepository};
pub use table_manager::{TableManager, TableNames};
