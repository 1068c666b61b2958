use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::repositories::TableNames;

/// Prefix of every environment variable read by the service
pub const ENV_PREFIX: &str = "ECOMMERCE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {message}")]
    LoadError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub api: ApiConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_orders_table")]
    pub orders_table_name: String,
    #[serde(default = "default_products_table")]
    pub products_table_name: String,
    #[serde(default = "default_product_images_table")]
    pub product_images_table_name: String,
    #[serde(default = "default_counters_table")]
    pub counters_table_name: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Override for DynamoDB Local and similar
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub auto_create_tables: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_root")]
    pub storage_root_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Prefix of the `self` links handed out in product resources
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_service_version")]
    pub service_version: String,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub enable_json_logging: bool,
}

impl Config {
    pub fn from_environment() -> Result<Self, ConfigError> {
        info!("Loading configuration from environment");
        Self::from_source(config::Environment::with_prefix(ENV_PREFIX))
    }

    /// Load every section from one environment source
    pub fn from_source(source: config::Environment) -> Result<Self, ConfigError> {
        let config = Config {
            server: load_section(source.clone(), "server")?,
            database: load_section(source.clone(), "database")?,
            storage: load_section(source.clone(), "storage")?,
            api: load_section(source.clone(), "api")?,
            observability: load_section(source, "observability")?,
        };

        config.validate()?;

        info!("Configuration loaded successfully");
        debug!("Configuration: {:?}", config);

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(validation_error("Server port cannot be 0"));
        }

        if self.server.request_timeout_seconds == 0 {
            return Err(validation_error("Request timeout cannot be 0"));
        }

        if self.server.max_upload_size == 0 {
            return Err(validation_error("Max upload size cannot be 0"));
        }

        let tables = [
            ("Orders", &self.database.orders_table_name),
            ("Products", &self.database.products_table_name),
            ("Product images", &self.database.product_images_table_name),
            ("Counters", &self.database.counters_table_name),
        ];
        for (label, name) in tables {
            if name.trim().is_empty() {
                return Err(validation_error(&format!(
                    "{} table name cannot be empty",
                    label
                )));
            }
        }

        if self.storage.storage_root_dir.as_os_str().is_empty() {
            return Err(validation_error("Storage root directory cannot be empty"));
        }

        Ok(())
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    pub fn table_names(&self) -> TableNames {
        TableNames {
            orders: self.orders_table_name.clone(),
            products: self.products_table_name.clone(),
            product_images: self.product_images_table_name.clone(),
            counters: self.counters_table_name.clone(),
        }
    }

    /// Build a DynamoDB client for the configured region and endpoint
    pub async fn dynamodb_client(&self) -> DynamoDbClient {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(self.region.clone()));

        if let Some(endpoint_url) = &self.endpoint_url {
            info!("Using DynamoDB endpoint override: {}", endpoint_url);
            loader = loader.endpoint_url(endpoint_url);
        }

        DynamoDbClient::new(&loader.load().await)
    }
}

fn load_section<T: DeserializeOwned>(
    source: config::Environment,
    section: &str,
) -> Result<T, ConfigError> {
    let settings = config::Config::builder()
        .add_source(source)
        .build()
        .map_err(|e| ConfigError::LoadError {
            message: format!("Failed to load {} config: {}", section, e),
        })?;

    settings
        .try_deserialize()
        .map_err(|e| ConfigError::LoadError {
            message: format!("Failed to deserialize {} config: {}", section, e),
        })
}

fn validation_error(message: &str) -> ConfigError {
    ConfigError::ValidationError {
        message: message.to_string(),
    }
}

// Default value functions
pub(crate) fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub(crate) fn default_port() -> u16 {
    8080
}

pub(crate) fn default_timeout() -> u64 {
    30
}

pub(crate) fn default_max_request_size() -> usize {
    1024 * 1024 // 1MB
}

pub(crate) fn default_max_upload_size() -> usize {
    10 * 1024 * 1024
}

pub(crate) fn default_orders_table() -> String {
    "Orders".to_string()
}

pub(crate) fn default_products_table() -> String {
    "Products".to_string()
}

pub(crate) fn default_product_images_table() -> String {
    "ProductImages".to_string()
}

pub(crate) fn default_counters_table() -> String {
    "Counters".to_string()
}

pub(crate) fn default_region() -> String {
    "us-west-2".to_string()
}

pub(crate) fn default_storage_root() -> PathBuf {
    PathBuf::from("./data")
}

pub(crate) fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}

pub(crate) fn default_service_name() -> String {
    "ecommerce-rs".to_string()
}

pub(crate) fn default_service_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

pub(crate) fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests;
