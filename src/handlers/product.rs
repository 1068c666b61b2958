use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use tracing::{info, instrument, warn};

use super::api::{error_response, service_error_to_response, ApiError, ApiState};
use crate::models::{Product, ProductImage, ProductResource, ServiceError, Validate};

/// Multipart field carrying the uploaded image
const UPLOAD_FIELD: &str = "file";

#[instrument(name = "list_products", skip(state))]
pub async fn list_products(
    State(state): State<ApiState>,
) -> Result<Json<Vec<ProductResource>>, ApiError> {
    let products = state
        .business
        .trace_product_operation("list", state.service.get_products())
        .await
        .map_err(service_error_to_response)?;

    let resources = products
        .iter()
        .map(|product| product.to_resource(&state.public_base_url))
        .collect();

    Ok(Json(resources))
}

#[instrument(name = "get_product", skip(state), fields(product_id = %id))]
pub async fn get_product(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
) -> Result<Json<ProductResource>, ApiError> {
    let product = state
        .business
        .trace_product_operation("get", async {
            state
                .service
                .get_product(id)
                .await?
                .ok_or(ServiceError::ProductNotFound { id })
        })
        .await
        .map_err(service_error_to_response)?;

    Ok(Json(product.to_resource(&state.public_base_url)))
}

#[instrument(name = "create_product", skip(state, product), fields(name = %product.name))]
pub async fn create_product(
    State(state): State<ApiState>,
    Json(product): Json<Product>,
) -> Result<Json<Product>, ApiError> {
    product
        .validate()
        .map_err(|errors| service_error_to_response(errors.into()))?;

    let saved = state
        .business
        .trace_product_operation("create", state.service.create_product(product))
        .await
        .map_err(service_error_to_response)?;

    info!(product_id = ?saved.id, "Product created");
    Ok(Json(saved))
}

/// Copy name, price and description onto the stored product. An unknown id
/// yields `null`.
#[instrument(name = "update_product", skip(state, product), fields(product_id = %id))]
pub async fn update_product(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
    Json(product): Json<Product>,
) -> Result<Json<Option<Product>>, ApiError> {
    product
        .validate()
        .map_err(|errors| service_error_to_response(errors.into()))?;

    let updated = state
        .business
        .trace_product_operation("update", async {
            match state.service.get_product(id).await? {
                Some(mut existing) => {
                    existing.apply_update(product);
                    state.service.save_product(existing).await.map(Some)
                }
                None => Ok(None),
            }
        })
        .await
        .map_err(service_error_to_response)?;

    Ok(Json(updated))
}

#[instrument(name = "list_product_images", skip(state), fields(product_id = %product_id))]
pub async fn list_product_images(
    State(state): State<ApiState>,
    Path(product_id): Path<u64>,
) -> Result<Json<Vec<ProductImage>>, ApiError> {
    let images = state
        .business
        .trace_image_operation("list", state.service.get_product_images(product_id))
        .await
        .map_err(service_error_to_response)?;

    Ok(Json(images))
}

/// Stream the stored image bytes with a content type guessed from the file name
#[instrument(name = "serve_image", skip(state), fields(image_id = %id))]
pub async fn serve_image(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
) -> Result<Response, ApiError> {
    let resource = state
        .business
        .trace_image_operation("serve", async {
            let image = state
                .service
                .get_product_image(id)
                .await?
                .ok_or(ServiceError::ProductImageNotFound { id })?;

            state
                .storage
                .load_as_resource(&image.storage_path())
                .await
                .map_err(ServiceError::from)
        })
        .await
        .map_err(service_error_to_response)?;

    let content_type = resource.content_type();

    Ok(([(header::CONTENT_TYPE, content_type)], resource.bytes).into_response())
}

/// Store a multipart upload under the product's image directory and register it
#[instrument(name = "upload_image", skip(state, multipart), fields(product_id = %product_id))]
pub async fn upload_image(
    State(state): State<ApiState>,
    Path(product_id): Path<u64>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let (original_name, bytes) = read_upload(multipart).await?;

    let filename = state
        .business
        .trace_image_operation("upload", async {
            state.service.require_product(product_id).await?;

            let directory = format!("/{}", ProductImage::directory(product_id));
            let stored = state
                .storage
                .store(&bytes, &original_name, &directory)
                .await?;

            state.service.add_product_image(product_id, stored).await
        })
        .await
        .map_err(service_error_to_response)?;

    info!(filename = %filename, "Image uploaded");

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        filename,
    )
        .into_response())
}

/// Pull the `file` field out of a multipart body
async fn read_upload(mut multipart: Multipart) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Malformed multipart body: {}", e);
        error_response(StatusCode::BAD_REQUEST, "Malformed multipart body")
    })? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| {
            warn!("Failed to read upload: {}", e);
            error_response(StatusCode::BAD_REQUEST, "Failed to read uploaded file")
        })?;

        return Ok((original_name, bytes.to_vec()));
    }

    Err(error_response(
        StatusCode::BAD_REQUEST,
        "Missing multipart field: file",
    ))
}
