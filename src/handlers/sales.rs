use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    Extension,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    errors::ApiError,
    handlers::common::{
        created_response, map_service_error, success_response, validate_input, PaginationParams,
    },
    services::sales::{CreateCustomSaleRequest, CreateSaleRequest},
    AppState,
};

/// Record a standard sale at list prices
#[utoipa::path(
    post,
    path = "/api/v1/sales",
    request_body = CreateSaleRequest,
    responses(
        (status = 201, description = "Sale recorded", body = crate::services::sales::SaleResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown flavor", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "sales"
)]
pub async fn create_sale(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateSaleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let sale = state
        .services
        .sales
        .create_sale(&auth_user.cashier_email(), payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(sale))
}

/// Record a single-unit sale at an operator-entered price
#[utoipa::path(
    post,
    path = "/api/v1/sales/custom",
    request_body = CreateCustomSaleRequest,
    responses(
        (status = 201, description = "Custom-priced sale recorded", body = crate::services::sales::SaleResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown flavor", body = crate::errors::ErrorResponse),
        (status = 422, description = "Out of stock", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "sales"
)]
pub async fn create_custom_sale(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateCustomSaleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let sale = state
        .services
        .sales
        .create_custom_sale(&auth_user.cashier_email(), payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(sale))
}

/// Paginated sales history, newest first
#[utoipa::path(
    get,
    path = "/api/v1/sales",
    params(PaginationParams),
    responses(
        (status = 200, description = "Sales page returned", body = crate::services::sales::SaleListResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "sales"
)]
pub async fn list_sales(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .services
        .sales
        .list_sales(
            params.page(),
            params.per_page(state.config.api_max_page_size as u64),
        )
        .await
        .map_err(map_service_error)?;
    Ok(success_response(page))
}

/// Count, gross total and average ticket over all sales
#[utoipa::path(
    get,
    path = "/api/v1/sales/summary",
    responses(
        (status = 200, description = "Summary returned", body = crate::services::sales::SalesSummary),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "sales"
)]
pub async fn sales_summary(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .services
        .sales
        .sales_summary()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(summary))
}

/// Fetch one sale with its line items
#[utoipa::path(
    get,
    path = "/api/v1/sales/{id}",
    params(("id" = Uuid, Path, description = "Sale id")),
    responses(
        (status = 200, description = "Sale returned", body = crate::services::sales::SaleResponse),
        (status = 404, description = "Sale not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "sales"
)]
pub async fn get_sale(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let sale = state
        .services
        .sales
        .get_sale(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(sale))
}
