use axum::{
    extract::{Json, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    errors::ApiError,
    handlers::common::{map_service_error, success_response},
    AppState,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetBalanceRequest {
    pub balance: Decimal,
}

/// Current cash balance
#[utoipa::path(
    get,
    path = "/api/v1/balance",
    responses(
        (status = 200, description = "Balance returned", body = crate::services::balance::BalanceResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "balance"
)]
pub async fn get_balance(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let balance = state
        .services
        .balance
        .get_balance()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(balance))
}

/// Overwrite the cash balance (manual correction / opening balance)
#[utoipa::path(
    put,
    path = "/api/v1/balance",
    request_body = SetBalanceRequest,
    responses(
        (status = 200, description = "Balance overwritten", body = crate::services::balance::BalanceResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "balance"
)]
pub async fn set_balance(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SetBalanceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let balance = state
        .services
        .balance
        .set_balance(payload.balance)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(balance))
}
