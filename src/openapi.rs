use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Doceria POS API",
        description = r#"
Point-of-sale backend for a sweets shop.

- **Inventory**: flavor-level stock with a suggested-price helper
- **Sales**: standard and custom-priced sale recording
- **Balance**: the cash-on-hand ledger
- **History**: paginated sales listing and summary figures

All endpoints under `/api/v1` require a bearer token obtained from
`/auth/login`; mutating the balance requires the admin role.
        "#,
    ),
    paths(
        // Inventory
        crate::handlers::inventory::list_inventory,
        crate::handlers::inventory::list_available,
        crate::handlers::inventory::add_stock,
        crate::handlers::inventory::update_flavor,
        crate::handlers::inventory::remove_flavor,

        // Sales
        crate::handlers::sales::create_sale,
        crate::handlers::sales::create_custom_sale,
        crate::handlers::sales::list_sales,
        crate::handlers::sales::sales_summary,
        crate::handlers::sales::get_sale,

        // Balance
        crate::handlers::balance::get_balance,
        crate::handlers::balance::set_balance,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::services::inventory::InventoryRow,
        crate::services::inventory::AddStockRequest,
        crate::services::inventory::AddStockResponse,
        crate::services::inventory::UpdateFlavorRequest,
        crate::services::inventory::UpdateFlavorResponse,
        crate::services::sales::CreateSaleRequest,
        crate::services::sales::SaleLineRequest,
        crate::services::sales::CreateCustomSaleRequest,
        crate::services::sales::SaleResponse,
        crate::services::sales::SaleItemResponse,
        crate::services::sales::SaleListResponse,
        crate::services::sales::SalesSummary,
        crate::services::balance::BalanceResponse,
        crate::handlers::balance::SetBalanceRequest,
    )),
    tags(
        (name = "inventory", description = "Flavor-level stock management"),
        (name = "sales", description = "Sale recording and history"),
        (name = "balance", description = "Cash-on-hand ledger"),
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at /docs, serving the generated document
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_contains_core_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        assert!(paths.iter().any(|p| p.as_str() == "/api/v1/inventory"));
        assert!(paths.iter().any(|p| p.as_str() == "/api/v1/sales/custom"));
        assert!(paths.iter().any(|p| p.as_str() == "/api/v1/balance"));
    }
}
