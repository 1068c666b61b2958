#[cfg(test)]
mod repository_tests {
    use crate::models::{Order, OrderItem, OrderStatus, Product, ProductImage, RepositoryError};
    use aws_sdk_dynamodb::types::AttributeValue;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    use crate::repositories::id_sequence::IdSequence;
    use crate::repositories::order_repository::*;
    use crate::repositories::product_image_repository::*;
    use crate::repositories::product_repository::*;

    fn create_test_client() -> Arc<aws_sdk_dynamodb::Client> {
        let config = aws_sdk_dynamodb::Config::builder()
            .region(aws_sdk_dynamodb::config::Region::new("us-east-1"))
            .behavior_version(aws_sdk_dynamodb::config::BehaviorVersion::latest())
            .build();
        Arc::new(aws_sdk_dynamodb::Client::from_conf(config))
    }

    fn create_test_sequence(client: Arc<aws_sdk_dynamodb::Client>) -> Arc<IdSequence> {
        Arc::new(IdSequence::new(
            client,
            "test-counters".to_string(),
            "us-east-1".to_string(),
        ))
    }

    fn create_test_order() -> Order {
        let mut order = Order {
            id: None,
            status: OrderStatus::Processing,
            total: dec!(31.50),
            created_at: Some(Utc::now()),
            items: vec![OrderItem::new(4, 2), OrderItem::new(9, 1)],
        };
        order.assign_id(21);
        order.items[0].id = Some(100);
        order.items[1].id = Some(101);
        order
    }

    mod order_repository_tests {
        use super::*;

        fn repo() -> DynamoDbOrderRepository {
            let client = create_test_client();
            DynamoDbOrderRepository::new(
                client.clone(),
                create_test_sequence(client),
                "test-orders".to_string(),
                "us-east-1".to_string(),
            )
        }

        #[test]
        fn test_order_to_item_conversion() {
            let order = create_test_order();
            let item = repo().order_to_item(&order).unwrap();

            assert!(item.contains_key("id"));
            assert!(item.contains_key("status"));
            assert!(item.contains_key("total"));
            assert!(item.contains_key("created_at"));

            if let Some(AttributeValue::L(items)) = item.get("items") {
                assert_eq!(items.len(), 2);
                if let AttributeValue::M(first) = &items[0] {
                    assert_eq!(first.get("order_id"), Some(&AttributeValue::N("21".to_string())));
                    assert_eq!(first.get("product_id"), Some(&AttributeValue::N("4".to_string())));
                } else {
                    panic!("Expected map value for order item");
                }
            } else {
                panic!("Expected list value for items");
            }
        }

        #[test]
        fn test_order_round_trip_through_item() {
            let order = create_test_order();
            let repo = repo();

            let item = repo.order_to_item(&order).unwrap();
            let parsed = repo.item_to_order(item).unwrap();

            assert_eq!(parsed.id, Some(21));
            assert_eq!(parsed.status, OrderStatus::Processing);
            assert_eq!(parsed.total, dec!(31.50));
            assert_eq!(parsed.items, order.items);
            assert!(parsed.items_linked());
        }

        #[test]
        fn test_order_without_id_is_rejected() {
            let mut order = create_test_order();
            order.id = None;

            match repo().order_to_item(&order) {
                Err(RepositoryError::InvalidItem { message }) => {
                    assert!(message.contains("Order"))
                }
                other => panic!("Expected InvalidItem, got {:?}", other),
            }
        }

        #[test]
        fn test_unlinked_item_is_rejected() {
            let mut order = create_test_order();
            order.items[1].order_id = None;

            assert!(repo().order_to_item(&order).is_err());
        }

        #[test]
        fn test_item_to_order_missing_total() {
            let order = create_test_order();
            let repo = repo();
            let mut item = repo.order_to_item(&order).unwrap();
            item.remove("total");

            assert!(repo.item_to_order(item).is_err());
        }
    }

    mod product_repository_tests {
        use super::*;

        fn repo() -> DynamoDbProductRepository {
            let client = create_test_client();
            DynamoDbProductRepository::new(
                client.clone(),
                create_test_sequence(client),
                "test-products".to_string(),
                "us-east-1".to_string(),
            )
        }

        fn create_test_product() -> Product {
            Product {
                id: Some(5),
                name: "Garden Hose".to_string(),
                price: dec!(24.99),
                description: "Twenty metre hose".to_string(),
                group: "garden".to_string(),
            }
        }

        #[test]
        fn test_product_to_item_conversion() {
            let item = repo().product_to_item(&create_test_product()).unwrap();

            assert_eq!(item.get("id"), Some(&AttributeValue::N("5".to_string())));
            assert_eq!(item.get("price"), Some(&AttributeValue::N("24.99".to_string())));
            assert_eq!(
                item.get("product_group"),
                Some(&AttributeValue::S("garden".to_string()))
            );
        }

        #[test]
        fn test_item_to_product_conversion() {
            let repo = repo();
            let product = create_test_product();
            let item = repo.product_to_item(&product).unwrap();

            assert_eq!(repo.item_to_product(item).unwrap(), product);
        }

        #[test]
        fn test_item_to_product_optional_fields() {
            let repo = repo();
            let mut item = repo.product_to_item(&create_test_product()).unwrap();
            item.remove("description");
            item.remove("product_group");

            let product = repo.item_to_product(item).unwrap();
            assert_eq!(product.description, "");
            assert_eq!(product.group, "");
        }

        #[test]
        fn test_repository_creation() {
            assert_eq!(repo().table_name(), "test-products");
        }
    }

    mod product_image_repository_tests {
        use super::*;

        fn repo() -> DynamoDbProductImageRepository {
            let client = create_test_client();
            DynamoDbProductImageRepository::new(
                client.clone(),
                create_test_sequence(client),
                "test-product-images".to_string(),
                "us-east-1".to_string(),
            )
        }

        #[test]
        fn test_image_conversion() {
            let repo = repo();
            let image = ProductImage {
                id: Some(8),
                product_id: 42,
                path: "4b1f.png".to_string(),
            };

            let item = repo.image_to_item(&image).unwrap();
            assert_eq!(item.get("product_id"), Some(&AttributeValue::N("42".to_string())));

            assert_eq!(repo.item_to_image(item).unwrap(), image);
        }

        #[test]
        fn test_repository_uses_product_index() {
            let repo = repo();
            assert_eq!(repo.table_name(), "test-product-images");
            assert_eq!(repo.product_id_index(), PRODUCT_ID_INDEX);
        }
    }
}
