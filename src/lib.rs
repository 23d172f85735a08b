//! Doceria POS API Library
//!
//! Point-of-sale backend for a sweets shop: flavor-level inventory, standard
//! and custom-priced sales, a cash-balance ledger and a sales history report.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod middleware_helpers;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::{permissions as perm, AuthRouterExt};

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<db::DbPool>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
    pub auth: Arc<auth::AuthService>,
}

/// Common response wrapper
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// The versioned API surface, with per-route permission gating
pub fn api_v1_routes() -> Router<Arc<AppState>> {
    let inventory_read = Router::new()
        .route("/inventory", get(handlers::inventory::list_inventory))
        .route(
            "/inventory/available",
            get(handlers::inventory::list_available),
        )
        .with_permission(perm::INVENTORY_READ);

    let inventory_mutate = Router::new()
        .route(
            "/inventory",
            axum::routing::post(handlers::inventory::add_stock),
        )
        .route(
            "/inventory/:id",
            axum::routing::put(handlers::inventory::update_flavor)
                .delete(handlers::inventory::remove_flavor),
        )
        .with_permission(perm::INVENTORY_ADJUST);

    let sales_create = Router::new()
        .route("/sales", axum::routing::post(handlers::sales::create_sale))
        .route(
            "/sales/custom",
            axum::routing::post(handlers::sales::create_custom_sale),
        )
        .with_permission(perm::SALES_CREATE);

    let sales_read = Router::new()
        .route("/sales", get(handlers::sales::list_sales))
        .route("/sales/summary", get(handlers::sales::sales_summary))
        .route("/sales/:id", get(handlers::sales::get_sale))
        .with_permission(perm::SALES_READ);

    let balance_read = Router::new()
        .route("/balance", get(handlers::balance::get_balance))
        .with_permission(perm::BALANCE_READ);

    let balance_manage = Router::new()
        .route(
            "/balance",
            axum::routing::put(handlers::balance::set_balance),
        )
        .with_permission(perm::BALANCE_MANAGE);

    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .merge(inventory_read)
        .merge(inventory_mutate)
        .merge(sales_create)
        .merge(sales_read)
        .merge(balance_read)
        .merge(balance_manage)
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let status_data = json!({
        "status": "ok",
        "service": "doceria-pos-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[tokio::test]
    async fn error_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-err"), async {
                ApiResponse::<()>::error("oops".into())
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-err"));
        assert!(!meta.timestamp.is_empty());
    }
}
