use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::{
    health_check, metrics_handler, order, product, request_validation_middleware,
    security_headers_middleware, RequestLimits,
};
use crate::models::{RepositoryError, ServiceError, StorageError};
use crate::observability::{observability_middleware, BusinessTracingMiddleware, Metrics};
use crate::services::{EcommerceService, StorageService};

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<Value>);

/// Shared application state for the order and product handlers
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<EcommerceService>,
    pub storage: Arc<dyn StorageService>,
    pub public_base_url: String,
    pub business: BusinessTracingMiddleware,
}

impl ApiState {
    pub fn new(
        service: Arc<EcommerceService>,
        storage: Arc<dyn StorageService>,
        public_base_url: String,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            service,
            storage,
            public_base_url,
            business: BusinessTracingMiddleware::new(metrics),
        }
    }
}

/// Server-level knobs applied as router layers
#[derive(Debug, Clone, Copy)]
pub struct RouterSettings {
    pub limits: RequestLimits,
    pub request_timeout: Duration,
}

/// Build the full application router
pub fn create_app(state: ApiState, metrics: Arc<Metrics>, settings: RouterSettings) -> Router {
    let metrics_for_middleware = metrics.clone();
    let limits = settings.limits;

    Router::new()
        .route("/health/status", get(health_check))
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
        .route("/order", get(order::list_orders).post(order::create_order))
        .route(
            "/order/:id",
            get(order::get_order).post(order::update_order),
        )
        .route(
            "/product",
            get(product::list_products).post(product::create_product),
        )
        .route(
            "/product/:id",
            get(product::get_product).post(product::update_product),
        )
        .route("/product/:id/images", get(product::list_product_images))
        .route("/product/image/:id", get(product::serve_image))
        .route(
            "/product/:id/uploadimage",
            post(product::upload_image).layer(DefaultBodyLimit::max(limits.max_upload_size)),
        )
        .with_state(state)
        // Outermost layer last
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(move |req, next| {
            request_validation_middleware(limits, req, next)
        }))
        .layer(TimeoutLayer::new(settings.request_timeout))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(move |req, next| {
            observability_middleware(metrics_for_middleware.clone(), req, next)
        }))
}

/// Map a service error onto a status code and a JSON error body
pub fn service_error_to_response(err: ServiceError) -> ApiError {
    let (status, message) = match &err {
        ServiceError::OrderNotFound { .. }
        | ServiceError::ProductNotFound { .. }
        | ServiceError::ProductImageNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::Validation { errors } => {
            let details: Vec<String> = errors.errors().iter().map(|e| e.to_string()).collect();
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Validation failed",
                    "details": details,
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                })),
            );
        }
        ServiceError::Repository { source } => match source {
            RepositoryError::ConnectionFailed => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Database connection failed".to_string(),
            ),
            RepositoryError::Timeout => {
                (StatusCode::REQUEST_TIMEOUT, "Request timeout".to_string())
            }
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        },
        ServiceError::Storage { source } => match source {
            StorageError::FileNotFound { .. } => (StatusCode::NOT_FOUND, source.to_string()),
            StorageError::EmptyFile { .. } | StorageError::InvalidPath { .. } => {
                (StatusCode::BAD_REQUEST, source.to_string())
            }
            StorageError::Io { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        },
    };

    error_response(status, &message)
}

/// JSON error body with a timestamp
pub fn error_response(status: StatusCode, message: &str) -> ApiError {
    (
        status,
        Json(json!({
            "error": message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}
