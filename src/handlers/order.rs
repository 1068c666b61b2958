use axum::{
    extract::{Path, State},
    response::Json,
};
use tracing::{info, instrument};

use super::api::{service_error_to_response, ApiError, ApiState};
use crate::models::{Order, ServiceError, Validate};

#[instrument(name = "list_orders", skip(state))]
pub async fn list_orders(State(state): State<ApiState>) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = state
        .business
        .trace_order_operation("list", state.service.get_orders())
        .await
        .map_err(service_error_to_response)?;

    Ok(Json(orders))
}

#[instrument(name = "get_order", skip(state), fields(order_id = %id))]
pub async fn get_order(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .business
        .trace_order_operation("get", async {
            state
                .service
                .get_order(id)
                .await?
                .ok_or(ServiceError::OrderNotFound { id })
        })
        .await
        .map_err(service_error_to_response)?;

    Ok(Json(order))
}

#[instrument(name = "create_order", skip(state, order), fields(items = order.items.len()))]
pub async fn create_order(
    State(state): State<ApiState>,
    Json(order): Json<Order>,
) -> Result<Json<Order>, ApiError> {
    order
        .validate()
        .map_err(|errors| service_error_to_response(errors.into()))?;

    let saved = state
        .business
        .trace_order_operation("create", state.service.create_order(order))
        .await
        .map_err(service_error_to_response)?;

    info!(order_id = ?saved.id, "Order created");
    Ok(Json(saved))
}

/// Re-save the stored order. The body is validated but its fields are not
/// applied; an unknown id yields `null`.
#[instrument(name = "update_order", skip(state, order), fields(order_id = %id))]
pub async fn update_order(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
    Json(order): Json<Order>,
) -> Result<Json<Option<Order>>, ApiError> {
    order
        .validate()
        .map_err(|errors| service_error_to_response(errors.into()))?;

    let updated = state
        .business
        .trace_order_operation("update", async {
            match state.service.get_order(id).await? {
                Some(existing) => state.service.save_order(existing).await.map(Some),
                None => Ok(None),
            }
        })
        .await
        .map_err(service_error_to_response)?;

    Ok(Json(updated))
}
