use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info};

use ecommerce_rs::{
    handlers::{create_app, ApiState, RequestLimits, RouterSettings},
    init_observability,
    observability::Metrics,
    repositories::{
        DynamoDbOrderRepository, DynamoDbProductImageRepository, DynamoDbProductRepository,
        IdSequence, TableManager,
    },
    services::{EcommerceService, FileSystemStorage},
    shutdown_observability, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_environment().context("Failed to load configuration")?;

    init_observability(
        &config.observability.service_name,
        &config.observability.service_version,
        config.observability.otlp_endpoint.as_deref().unwrap_or_default(),
        &config.observability.log_level,
        config.observability.enable_json_logging,
    )?;

    info!(
        "Starting {} v{}",
        config.observability.service_name, config.observability.service_version
    );
    info!("Region: {}", config.database.region);
    info!(
        "DynamoDB Tables: orders={}, products={}, product_images={}, counters={}",
        config.database.orders_table_name,
        config.database.products_table_name,
        config.database.product_images_table_name,
        config.database.counters_table_name
    );

    let metrics = Arc::new(Metrics::new()?);

    let dynamodb_client = Arc::new(config.database.dynamodb_client().await);

    if config.database.auto_create_tables {
        TableManager::new(dynamodb_client.clone())
            .create_all_tables(&config.database.table_names())
            .await
            .context("Failed to create DynamoDB tables")?;
    }

    let region = config.database.region.clone();
    let ids = Arc::new(IdSequence::new(
        dynamodb_client.clone(),
        config.database.counters_table_name.clone(),
        region.clone(),
    ));
    let orders = Arc::new(DynamoDbOrderRepository::new(
        dynamodb_client.clone(),
        ids.clone(),
        config.database.orders_table_name.clone(),
        region.clone(),
    ));
    let products = Arc::new(DynamoDbProductRepository::new(
        dynamodb_client.clone(),
        ids.clone(),
        config.database.products_table_name.clone(),
        region.clone(),
    ));
    let images = Arc::new(DynamoDbProductImageRepository::new(
        dynamodb_client,
        ids,
        config.database.product_images_table_name.clone(),
        region,
    ));
    info!("Repositories initialized successfully");

    let storage = FileSystemStorage::new(config.storage.storage_root_dir.clone());
    storage
        .init()
        .await
        .context("Failed to initialize image storage")?;

    let service = Arc::new(EcommerceService::new(orders, products, images));
    let state = ApiState::new(
        service,
        Arc::new(storage),
        config.api.public_base_url.clone(),
        metrics.clone(),
    );

    let app = create_app(
        state,
        metrics,
        RouterSettings {
            limits: RequestLimits {
                max_request_size: config.server.max_request_size,
                max_upload_size: config.server.max_upload_size,
            },
            request_timeout: config.server.request_timeout(),
        },
    );

    let addr: SocketAddr = config
        .server
        .bind_address()
        .parse()
        .context("Invalid server address")?;
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutdown signal received");
        shutdown_observability().await;
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
