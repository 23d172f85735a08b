use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::{product, product_flavor, sale, sale_item};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::balance::credit_balance;
use crate::services::inventory::resync_legacy_stock;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SaleLineRequest {
    pub flavor_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateSaleRequest {
    pub items: Vec<SaleLineRequest>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCustomSaleRequest {
    pub flavor_id: Uuid,
    /// Operator-entered price for the single unit sold
    pub price: Decimal,
    /// Justification recorded on the sale
    #[validate(length(min = 1, message = "A reason is required for a custom-priced sale"))]
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SaleItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub flavor_id: Uuid,
    pub product_name: String,
    pub flavor: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SaleResponse {
    pub id: Uuid,
    pub cashier_email: String,
    pub total: Decimal,
    pub note: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub items: Vec<SaleItemResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SaleListResponse {
    pub sales: Vec<SaleResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SalesSummary {
    pub count: u64,
    pub gross_total: Decimal,
    pub average_ticket: Decimal,
}

struct PricedLine {
    product_id: Uuid,
    flavor_id: Uuid,
    product_name: String,
    flavor: String,
    quantity: i32,
    unit_price: Decimal,
}

/// Service recording sales and serving the history report
#[derive(Clone)]
pub struct SalesService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl SalesService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Records a standard sale at list prices. Stock checks, the sale rows,
    /// the stock decrements and the balance credit share one transaction.
    #[instrument(skip(self, request), fields(cashier = %cashier_email, lines = request.items.len()))]
    pub async fn create_sale(
        &self,
        cashier_email: &str,
        request: CreateSaleRequest,
    ) -> Result<SaleResponse, ServiceError> {
        if request.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "A sale needs at least one item".to_string(),
            ));
        }
        if request.items.iter().any(|l| l.quantity < 1) {
            return Err(ServiceError::ValidationError(
                "Item quantities must be at least 1".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for line in &request.items {
            if !seen.insert(line.flavor_id) {
                return Err(ServiceError::InvalidInput(format!(
                    "Flavor {} appears more than once in the sale",
                    line.flavor_id
                )));
            }
        }

        let txn = self.db_pool.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for sale");
            ServiceError::DatabaseError(e)
        })?;

        let mut priced_lines = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let flavor = product_flavor::Entity::find_by_id(line.flavor_id)
                .one(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Flavor {} not found", line.flavor_id))
                })?;

            let product = product::Entity::find_by_id(flavor.product_id)
                .one(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?
                .ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "Flavor {} has no owning product",
                        flavor.id
                    ))
                })?;

            if flavor.quantity < line.quantity {
                return Err(ServiceError::InsufficientStock(format!(
                    "Requested {} of '{}' flavor '{}' but only {} in stock",
                    line.quantity, product.name, flavor.flavor, flavor.quantity
                )));
            }

            priced_lines.push(PricedLine {
                product_id: product.id,
                flavor_id: flavor.id,
                product_name: product.name,
                flavor: flavor.flavor,
                quantity: line.quantity,
                unit_price: product.price,
            });
        }

        let total: Decimal = priced_lines
            .iter()
            .map(|l| l.unit_price * Decimal::from(l.quantity))
            .sum();

        let response = self
            .record_sale(&txn, cashier_email, total, None, priced_lines)
            .await?;
        let (old_balance, new_balance) = credit_balance(&txn, total).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit sale");
            ServiceError::DatabaseError(e)
        })?;

        info!(sale_id = %response.id, total = %total, "Sale recorded");

        self.event_sender
            .send_or_log(Event::SaleRecorded {
                sale_id: response.id,
                total,
                custom_priced: false,
            })
            .await;
        self.event_sender
            .send_or_log(Event::BalanceChanged {
                old_balance,
                new_balance,
            })
            .await;

        Ok(response)
    }

    /// Records a single-unit sale at an operator-entered price, persisting
    /// the justification as the sale note.
    #[instrument(skip(self, request), fields(cashier = %cashier_email, flavor_id = %request.flavor_id))]
    pub async fn create_custom_sale(
        &self,
        cashier_email: &str,
        request: CreateCustomSaleRequest,
    ) -> Result<SaleResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        if request.price <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Custom price must be greater than zero".to_string(),
            ));
        }
        let reason = request.reason.trim().to_string();
        if reason.is_empty() {
            return Err(ServiceError::ValidationError(
                "A reason is required for a custom-priced sale".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for custom sale");
            ServiceError::DatabaseError(e)
        })?;

        let flavor = product_flavor::Entity::find_by_id(request.flavor_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Flavor {} not found", request.flavor_id))
            })?;

        let product = product::Entity::find_by_id(flavor.product_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::InternalError(format!("Flavor {} has no owning product", flavor.id))
            })?;

        if flavor.quantity < 1 {
            return Err(ServiceError::InsufficientStock(format!(
                "'{}' flavor '{}' is out of stock",
                product.name, flavor.flavor
            )));
        }

        let line = PricedLine {
            product_id: product.id,
            flavor_id: flavor.id,
            product_name: product.name,
            flavor: flavor.flavor,
            quantity: 1,
            unit_price: request.price,
        };

        let response = self
            .record_sale(&txn, cashier_email, request.price, Some(reason), vec![line])
            .await?;
        let (old_balance, new_balance) = credit_balance(&txn, request.price).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit custom sale");
            ServiceError::DatabaseError(e)
        })?;

        info!(sale_id = %response.id, total = %request.price, "Custom-priced sale recorded");

        self.event_sender
            .send_or_log(Event::SaleRecorded {
                sale_id: response.id,
                total: request.price,
                custom_priced: true,
            })
            .await;
        self.event_sender
            .send_or_log(Event::BalanceChanged {
                old_balance,
                new_balance,
            })
            .await;

        Ok(response)
    }

    /// Inserts the sale header and lines, decrements stock and resyncs the
    /// aggregates, inside the caller's transaction.
    async fn record_sale(
        &self,
        txn: &sea_orm::DatabaseTransaction,
        cashier_email: &str,
        total: Decimal,
        note: Option<String>,
        lines: Vec<PricedLine>,
    ) -> Result<SaleResponse, ServiceError> {
        let sale_model = sale::ActiveModel {
            id: Set(Uuid::new_v4()),
            cashier_email: Set(cashier_email.to_string()),
            total: Set(total),
            note: Set(note),
            ..Default::default()
        };
        let sale_row = sale_model.insert(txn).await.map_err(ServiceError::DatabaseError)?;

        let mut items = Vec::with_capacity(lines.len());
        let mut touched_products = HashSet::new();

        for line in lines {
            let item_model = sale_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                sale_id: Set(sale_row.id),
                product_id: Set(line.product_id),
                flavor_id: Set(line.flavor_id),
                product_name: Set(line.product_name.clone()),
                flavor: Set(line.flavor.clone()),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
            };
            let item_row = item_model.insert(txn).await.map_err(ServiceError::DatabaseError)?;

            // Stock levels were checked before insertion; the entity-level
            // range validation still rejects a concurrent underflow.
            let flavor = product_flavor::Entity::find_by_id(line.flavor_id)
                .one(txn)
                .await
                .map_err(ServiceError::DatabaseError)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Flavor {} not found", line.flavor_id))
                })?;
            let remaining = flavor.quantity - line.quantity;
            let mut flavor_model: product_flavor::ActiveModel = flavor.into();
            flavor_model.quantity = Set(remaining);
            flavor_model
                .update(txn)
                .await
                .map_err(ServiceError::DatabaseError)?;

            touched_products.insert(line.product_id);
            items.push(SaleItemResponse {
                id: item_row.id,
                product_id: line.product_id,
                flavor_id: line.flavor_id,
                product_name: line.product_name,
                flavor: line.flavor,
                quantity: line.quantity,
                unit_price: line.unit_price,
                subtotal: line.unit_price * Decimal::from(line.quantity),
            });
        }

        for product_id in touched_products {
            resync_legacy_stock(txn, product_id).await?;
        }

        Ok(SaleResponse {
            id: sale_row.id,
            cashier_email: sale_row.cashier_email,
            total: sale_row.total,
            note: sale_row.note,
            recorded_at: sale_row.recorded_at,
            items,
        })
    }

    /// Paginated history, newest first. `page` is 1-based.
    #[instrument(skip(self))]
    pub async fn list_sales(&self, page: u64, per_page: u64) -> Result<SaleListResponse, ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);
        let per_page = per_page.max(1);

        let paginator = sale::Entity::find()
            .order_by_desc(sale::Column::RecordedAt)
            .paginate(db, per_page);

        let total = paginator
            .num_items()
            .await
            .map_err(ServiceError::DatabaseError)?;
        let sale_rows = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let sale_ids: Vec<Uuid> = sale_rows.iter().map(|s| s.id).collect();
        let mut items_by_sale: HashMap<Uuid, Vec<sale_item::Model>> = HashMap::new();
        if !sale_ids.is_empty() {
            let item_rows = sale_item::Entity::find()
                .filter(sale_item::Column::SaleId.is_in(sale_ids))
                .all(db)
                .await
                .map_err(ServiceError::DatabaseError)?;
            for item in item_rows {
                items_by_sale.entry(item.sale_id).or_default().push(item);
            }
        }

        let sales = sale_rows
            .into_iter()
            .map(|s| {
                let items = items_by_sale.remove(&s.id).unwrap_or_default();
                Self::to_response(s, items)
            })
            .collect();

        Ok(SaleListResponse {
            sales,
            total,
            page,
            per_page,
        })
    }

    /// Single sale with its line items
    #[instrument(skip(self), fields(sale_id = %sale_id))]
    pub async fn get_sale(&self, sale_id: Uuid) -> Result<SaleResponse, ServiceError> {
        let db = &*self.db_pool;

        let sale_row = sale::Entity::find_by_id(sale_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Sale {} not found", sale_id)))?;

        let items = sale_item::Entity::find()
            .filter(sale_item::Column::SaleId.eq(sale_id))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(Self::to_response(sale_row, items))
    }

    /// Count, gross total and average ticket over all sales, computed by
    /// the database
    #[instrument(skip(self))]
    pub async fn sales_summary(&self) -> Result<SalesSummary, ServiceError> {
        let db = &*self.db_pool;

        let count = sale::Entity::find()
            .count(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let gross_total: Decimal = sale::Entity::find()
            .select_only()
            .column_as(sale::Column::Total.sum(), "gross_total")
            .into_tuple::<Option<Decimal>>()
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .flatten()
            .unwrap_or(Decimal::ZERO);

        let average_ticket = if count > 0 {
            (gross_total / Decimal::from(count)).round_dp(2)
        } else {
            Decimal::ZERO
        };

        Ok(SalesSummary {
            count,
            gross_total,
            average_ticket,
        })
    }

    fn to_response(sale_row: sale::Model, items: Vec<sale_item::Model>) -> SaleResponse {
        SaleResponse {
            id: sale_row.id,
            cashier_email: sale_row.cashier_email,
            total: sale_row.total,
            note: sale_row.note,
            recorded_at: sale_row.recorded_at,
            items: items
                .into_iter()
                .map(|i| SaleItemResponse {
                    id: i.id,
                    product_id: i.product_id,
                    flavor_id: i.flavor_id,
                    product_name: i.product_name,
                    flavor: i.flavor,
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                    subtotal: i.unit_price * Decimal::from(i.quantity),
                })
                .collect(),
        }
    }
}
