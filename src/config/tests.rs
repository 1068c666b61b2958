use super::*;
use std::collections::HashMap;

fn source(vars: &[(&str, &str)]) -> config::Environment {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

    config::Environment::with_prefix(ENV_PREFIX).source(Some(map))
}

#[test]
fn test_defaults() {
    let config = Config::from_source(source(&[])).unwrap();

    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.request_timeout_seconds, 30);
    assert_eq!(config.server.max_request_size, 1024 * 1024);
    assert_eq!(config.server.max_upload_size, 10 * 1024 * 1024);

    assert_eq!(config.database.orders_table_name, "Orders");
    assert_eq!(config.database.products_table_name, "Products");
    assert_eq!(config.database.product_images_table_name, "ProductImages");
    assert_eq!(config.database.counters_table_name, "Counters");
    assert_eq!(config.database.endpoint_url, None);
    assert!(!config.database.auto_create_tables);

    assert_eq!(config.storage.storage_root_dir, PathBuf::from("./data"));
    assert_eq!(config.api.public_base_url, "http://localhost:8080");
    assert_eq!(config.observability.service_name, "ecommerce-rs");
    assert_eq!(config.observability.log_level, "info");
    assert!(!config.observability.enable_json_logging);
}

#[test]
fn test_overrides_from_environment() {
    let config = Config::from_source(source(&[
        ("ECOMMERCE_PORT", "9000"),
        ("ECOMMERCE_ORDERS_TABLE_NAME", "TestOrders"),
        ("ECOMMERCE_ENDPOINT_URL", "http://localhost:8000"),
        ("ECOMMERCE_AUTO_CREATE_TABLES", "true"),
        ("ECOMMERCE_STORAGE_ROOT_DIR", "/tmp/shop"),
        ("ECOMMERCE_PUBLIC_BASE_URL", "https://shop.example.com"),
        ("ECOMMERCE_ENABLE_JSON_LOGGING", "true"),
        ("ECOMMERCE_LOG_LEVEL", "debug"),
    ]))
    .unwrap();

    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.bind_address(), "0.0.0.0:9000");
    assert_eq!(config.database.orders_table_name, "TestOrders");
    assert_eq!(
        config.database.endpoint_url.as_deref(),
        Some("http://localhost:8000")
    );
    assert!(config.database.auto_create_tables);
    assert_eq!(config.storage.storage_root_dir, PathBuf::from("/tmp/shop"));
    assert_eq!(config.api.public_base_url, "https://shop.example.com");
    assert!(config.observability.enable_json_logging);
    assert_eq!(config.observability.log_level, "debug");
}

#[test]
fn test_table_names() {
    let config =
        Config::from_source(source(&[("ECOMMERCE_COUNTERS_TABLE_NAME", "Seq")])).unwrap();
    let tables = config.database.table_names();

    assert_eq!(tables.orders, "Orders");
    assert_eq!(tables.product_images, "ProductImages");
    assert_eq!(tables.counters, "Seq");
}

#[test]
fn test_request_timeout() {
    let config =
        Config::from_source(source(&[("ECOMMERCE_REQUEST_TIMEOUT_SECONDS", "45")])).unwrap();
    assert_eq!(config.server.request_timeout(), Duration::from_secs(45));
}

#[test]
fn test_rejects_zero_port() {
    let result = Config::from_source(source(&[("ECOMMERCE_PORT", "0")]));
    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
}

#[test]
fn test_rejects_zero_timeout() {
    let result = Config::from_source(source(&[("ECOMMERCE_REQUEST_TIMEOUT_SECONDS", "0")]));
    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
}

#[test]
fn test_rejects_empty_table_name() {
    let result = Config::from_source(source(&[("ECOMMERCE_PRODUCTS_TABLE_NAME", " ")]));

    match result {
        Err(ConfigError::ValidationError { message }) => {
            assert!(message.contains("Products"))
        }
        other => panic!("Expected validation error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_rejects_invalid_port() {
    let result = Config::from_source(source(&[("ECOMMERCE_PORT", "not-a-port")]));
    assert!(matches!(result, Err(ConfigError::LoadError { .. })));
}
