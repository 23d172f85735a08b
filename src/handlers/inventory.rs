use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    errors::ApiError,
    handlers::common::{
        created_response, map_service_error, no_content_response, success_response,
    },
    services::inventory::{AddStockRequest, UpdateFlavorRequest},
    AppState,
};

/// List every flavor row with its product
#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    responses(
        (status = 200, description = "Inventory list returned", body = [crate::services::inventory::InventoryRow]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn list_inventory(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let rows = state
        .services
        .inventory
        .list()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(rows))
}

/// List only flavors with stock on hand (feeds the sale forms)
#[utoipa::path(
    get,
    path = "/api/v1/inventory/available",
    responses(
        (status = 200, description = "In-stock flavors returned", body = [crate::services::inventory::InventoryRow]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn list_available(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let rows = state
        .services
        .inventory
        .list_available()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(rows))
}

/// Receive stock, creating the product and flavor rows as needed
#[utoipa::path(
    post,
    path = "/api/v1/inventory",
    request_body = AddStockRequest,
    responses(
        (status = 201, description = "Stock received", body = crate::services::inventory::AddStockResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 409, description = "Balance would go negative", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn add_stock(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AddStockRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .services
        .inventory
        .add_stock(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(result))
}

/// Edit a flavor's label and quantity
#[utoipa::path(
    put,
    path = "/api/v1/inventory/{id}",
    params(("id" = Uuid, Path, description = "Flavor id")),
    request_body = UpdateFlavorRequest,
    responses(
        (status = 200, description = "Flavor updated", body = crate::services::inventory::UpdateFlavorResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Flavor not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Label collision or negative balance", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn update_flavor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateFlavorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .services
        .inventory
        .update_flavor(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(result))
}

/// Remove a flavor row (and the product aggregate when it was the last one)
#[utoipa::path(
    delete,
    path = "/api/v1/inventory/{id}",
    params(("id" = Uuid, Path, description = "Flavor id")),
    responses(
        (status = 204, description = "Flavor removed"),
        (status = 404, description = "Flavor not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn remove_flavor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .inventory
        .remove_flavor(id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}
