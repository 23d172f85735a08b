use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, Order,
    QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::{legacy_stock, product, product_flavor};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::balance::{debit_balance, read_balance};

/// Suggested sale price derived from unit cost: one and a half times the
/// cost, rounded up to the next multiple of five. Undefined for a
/// non-positive cost.
pub fn suggested_price(cost: Decimal) -> Option<Decimal> {
    if cost <= Decimal::ZERO {
        return None;
    }
    Some((cost * dec!(1.5) / dec!(5)).ceil() * dec!(5))
}

/// Recomputes the per-product aggregate row from the flavor rows, inside
/// the caller's transaction. The row is deleted when the product has no
/// flavor rows left. Returns the new aggregate quantity.
pub(crate) async fn resync_legacy_stock<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
) -> Result<i32, ServiceError> {
    let flavors = product_flavor::Entity::find()
        .filter(product_flavor::Column::ProductId.eq(product_id))
        .all(conn)
        .await
        .map_err(ServiceError::DatabaseError)?;

    if flavors.is_empty() {
        legacy_stock::Entity::delete_many()
            .filter(legacy_stock::Column::ProductId.eq(product_id))
            .exec(conn)
            .await
            .map_err(ServiceError::DatabaseError)?;
        return Ok(0);
    }

    let total: i32 = flavors.iter().map(|f| f.quantity).sum();

    let existing = legacy_stock::Entity::find()
        .filter(legacy_stock::Column::ProductId.eq(product_id))
        .one(conn)
        .await
        .map_err(ServiceError::DatabaseError)?;

    match existing {
        Some(row) => {
            let mut model: legacy_stock::ActiveModel = row.into();
            model.quantity = Set(total);
            model.update(conn).await.map_err(ServiceError::DatabaseError)?;
        }
        None => {
            let model = legacy_stock::ActiveModel {
                id: Set(Uuid::new_v4()),
                product_id: Set(product_id),
                quantity: Set(total),
                ..Default::default()
            };
            model.insert(conn).await.map_err(ServiceError::DatabaseError)?;
        }
    }

    Ok(total)
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct AddStockRequest {
    #[validate(length(min = 1, max = 255, message = "Product name is required"))]
    pub product_name: String,
    #[validate(length(min = 1, max = 255, message = "Flavor label is required"))]
    pub flavor: String,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i32,
    /// Unit cost paid for the received stock; debited from the balance
    pub cost_price: Option<Decimal>,
    /// List price; when absent or zero the suggested price applies
    pub sale_price: Option<Decimal>,
    #[serde(default)]
    pub allow_negative_balance: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddStockResponse {
    pub product_id: Uuid,
    pub flavor_id: Uuid,
    pub product_name: String,
    pub flavor: String,
    /// Stock level of the flavor after the add
    pub quantity: i32,
    pub applied_price: Decimal,
    pub used_suggested_price: bool,
    /// True when the quantity merged into a pre-existing flavor row
    pub merged: bool,
    pub cost_debited: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateFlavorRequest {
    #[validate(length(min = 1, max = 255, message = "Flavor label is required"))]
    pub flavor: String,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i32,
    /// Unit cost applied to a quantity increase
    pub unit_cost: Option<Decimal>,
    #[serde(default)]
    pub allow_negative_balance: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateFlavorResponse {
    pub flavor_id: Uuid,
    pub product_id: Uuid,
    pub flavor: String,
    pub quantity: i32,
    pub cost_debited: Decimal,
    pub balance: Decimal,
}

/// One flavor row joined with its product, as the sale forms consume it
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InventoryRow {
    pub flavor_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub flavor: String,
    pub quantity: i32,
    pub price: Decimal,
}

/// Service for flavor-level stock management
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// All flavor rows, ordered by product name then flavor label
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<InventoryRow>, ServiceError> {
        self.list_rows(false).await
    }

    /// Only rows with stock on hand
    #[instrument(skip(self))]
    pub async fn list_available(&self) -> Result<Vec<InventoryRow>, ServiceError> {
        self.list_rows(true).await
    }

    async fn list_rows(&self, only_in_stock: bool) -> Result<Vec<InventoryRow>, ServiceError> {
        let mut query = product_flavor::Entity::find().find_also_related(product::Entity);
        if only_in_stock {
            query = query.filter(product_flavor::Column::Quantity.gt(0));
        }

        let rows = query
            .order_by(product::Column::Name, Order::Asc)
            .order_by(product_flavor::Column::Flavor, Order::Asc)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let mut result = Vec::with_capacity(rows.len());
        for (flavor, product) in rows {
            let product = product.ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "Flavor {} has no owning product",
                    flavor.id
                ))
            })?;
            result.push(InventoryRow {
                flavor_id: flavor.id,
                product_id: product.id,
                product_name: product.name,
                flavor: flavor.flavor,
                quantity: flavor.quantity,
                price: product.price,
            });
        }

        Ok(result)
    }

    /// Receives stock: resolve-or-create the product and flavor, merge
    /// quantities, resync the aggregate row and debit the purchase cost,
    /// all in one transaction.
    #[instrument(skip(self, request), fields(product_name = %request.product_name, flavor = %request.flavor))]
    pub async fn add_stock(&self, request: AddStockRequest) -> Result<AddStockResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let product_name = request.product_name.trim().to_string();
        let flavor_label = request.flavor.trim().to_string();
        if product_name.is_empty() || flavor_label.is_empty() {
            return Err(ServiceError::ValidationError(
                "Product name and flavor cannot be blank".to_string(),
            ));
        }

        let cost_price = request.cost_price.unwrap_or(Decimal::ZERO);
        if cost_price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Cost price cannot be negative".to_string(),
            ));
        }

        let (applied_price, used_suggested_price) = match request.sale_price {
            Some(p) if p > Decimal::ZERO => (p, false),
            _ => match suggested_price(cost_price) {
                Some(p) => (p, true),
                None => {
                    return Err(ServiceError::ValidationError(
                        "A positive sale price is required when no cost price is given"
                            .to_string(),
                    ))
                }
            },
        };

        let txn = self.db_pool.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for stock add");
            ServiceError::DatabaseError(e)
        })?;

        // Price is set on create only; receiving more stock never reprices
        // an existing product.
        let product = match product::Entity::find()
            .filter(product::Column::Name.eq(product_name.clone()))
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
        {
            Some(p) => p,
            None => {
                let model = product::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    name: Set(product_name.clone()),
                    price: Set(applied_price),
                    ..Default::default()
                };
                model.insert(&txn).await.map_err(ServiceError::DatabaseError)?
            }
        };

        let existing_flavor = product_flavor::Entity::find()
            .filter(product_flavor::Column::ProductId.eq(product.id))
            .filter(product_flavor::Column::Flavor.eq(flavor_label.clone()))
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let (flavor, merged) = match existing_flavor {
            Some(row) => {
                let new_quantity = row.quantity + request.quantity;
                let mut model: product_flavor::ActiveModel = row.into();
                model.quantity = Set(new_quantity);
                let updated = model.update(&txn).await.map_err(ServiceError::DatabaseError)?;
                (updated, true)
            }
            None => {
                let model = product_flavor::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    product_id: Set(product.id),
                    flavor: Set(flavor_label.clone()),
                    quantity: Set(request.quantity),
                    ..Default::default()
                };
                let inserted = model.insert(&txn).await.map_err(ServiceError::DatabaseError)?;
                (inserted, false)
            }
        };

        resync_legacy_stock(&txn, product.id).await?;

        let cost_total = cost_price * Decimal::from(request.quantity);
        let (balance_change, balance) = if cost_total > Decimal::ZERO {
            let (old, new) =
                debit_balance(&txn, cost_total, request.allow_negative_balance).await?;
            (Some((old, new)), new)
        } else {
            (None, read_balance(&txn).await?)
        };

        txn.commit().await.map_err(|e| {
            error!(error = %e, product_id = %product.id, "Failed to commit stock add");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            product_id = %product.id,
            flavor_id = %flavor.id,
            quantity = request.quantity,
            merged,
            "Stock received"
        );

        self.event_sender
            .send_or_log(Event::StockReceived {
                product_id: product.id,
                flavor_id: flavor.id,
                quantity: request.quantity,
            })
            .await;
        if let Some((old_balance, new_balance)) = balance_change {
            self.event_sender
                .send_or_log(Event::BalanceChanged {
                    old_balance,
                    new_balance,
                })
                .await;
        }

        Ok(AddStockResponse {
            product_id: product.id,
            flavor_id: flavor.id,
            product_name,
            flavor: flavor_label,
            quantity: flavor.quantity,
            applied_price,
            used_suggested_price,
            merged,
            cost_debited: cost_total,
            balance,
        })
    }

    /// Edits a flavor's label and quantity. A quantity increase with a
    /// positive unit cost debits the balance by cost times the delta;
    /// decreases and label edits never touch the balance.
    #[instrument(skip(self, request), fields(flavor_id = %flavor_id))]
    pub async fn update_flavor(
        &self,
        flavor_id: Uuid,
        request: UpdateFlavorRequest,
    ) -> Result<UpdateFlavorResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let flavor_label = request.flavor.trim().to_string();
        if flavor_label.is_empty() {
            return Err(ServiceError::ValidationError(
                "Flavor label cannot be blank".to_string(),
            ));
        }

        let unit_cost = request.unit_cost.unwrap_or(Decimal::ZERO);
        if unit_cost < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Unit cost cannot be negative".to_string(),
            ));
        }

        let txn = self.db_pool.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for flavor update");
            ServiceError::DatabaseError(e)
        })?;

        let existing = product_flavor::Entity::find_by_id(flavor_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Flavor {} not found", flavor_id)))?;

        let sibling = product_flavor::Entity::find()
            .filter(product_flavor::Column::ProductId.eq(existing.product_id))
            .filter(product_flavor::Column::Flavor.eq(flavor_label.clone()))
            .filter(product_flavor::Column::Id.ne(flavor_id))
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;
        if sibling.is_some() {
            return Err(ServiceError::Conflict(format!(
                "The product already has a flavor named '{}'",
                flavor_label
            )));
        }

        let old_quantity = existing.quantity;
        let product_id = existing.product_id;
        let delta = request.quantity - old_quantity;

        let mut model: product_flavor::ActiveModel = existing.into();
        model.flavor = Set(flavor_label.clone());
        model.quantity = Set(request.quantity);
        let updated = model.update(&txn).await.map_err(ServiceError::DatabaseError)?;

        resync_legacy_stock(&txn, product_id).await?;

        let cost_total = if delta > 0 {
            unit_cost * Decimal::from(delta)
        } else {
            Decimal::ZERO
        };
        let (balance_change, balance) = if cost_total > Decimal::ZERO {
            let (old, new) =
                debit_balance(&txn, cost_total, request.allow_negative_balance).await?;
            (Some((old, new)), new)
        } else {
            (None, read_balance(&txn).await?)
        };

        txn.commit().await.map_err(|e| {
            error!(error = %e, flavor_id = %flavor_id, "Failed to commit flavor update");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            flavor_id = %flavor_id,
            old_quantity,
            new_quantity = request.quantity,
            "Flavor updated"
        );

        self.event_sender
            .send_or_log(Event::StockAdjusted {
                flavor_id,
                old_quantity,
                new_quantity: request.quantity,
            })
            .await;
        if let Some((old_balance, new_balance)) = balance_change {
            self.event_sender
                .send_or_log(Event::BalanceChanged {
                    old_balance,
                    new_balance,
                })
                .await;
        }

        Ok(UpdateFlavorResponse {
            flavor_id: updated.id,
            product_id,
            flavor: flavor_label,
            quantity: updated.quantity,
            cost_debited: cost_total,
            balance,
        })
    }

    /// Removes a flavor row; the product's aggregate row follows (resynced,
    /// or deleted when this was the last flavor).
    #[instrument(skip(self), fields(flavor_id = %flavor_id))]
    pub async fn remove_flavor(&self, flavor_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for flavor removal");
            ServiceError::DatabaseError(e)
        })?;

        let existing = product_flavor::Entity::find_by_id(flavor_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Flavor {} not found", flavor_id)))?;

        let product_id = existing.product_id;

        product_flavor::Entity::delete_by_id(flavor_id)
            .exec(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        resync_legacy_stock(&txn, product_id).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, flavor_id = %flavor_id, "Failed to commit flavor removal");
            ServiceError::DatabaseError(e)
        })?;

        info!(flavor_id = %flavor_id, product_id = %product_id, "Flavor removed");

        self.event_sender
            .send_or_log(Event::StockRemoved {
                product_id,
                flavor_id,
            })
            .await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("10", "15" ; "exact multiple stays")]
    #[test_case("12", "20" ; "rounds up to next five")]
    #[test_case("3.40", "10" ; "brigadeiro cost rounds to ten")]
    #[test_case("0.01", "5" ; "tiny cost floors at five")]
    #[test_case("100", "150" ; "large cost scales")]
    fn suggested_price_rounds_up_to_multiple_of_five(cost: &str, expected: &str) {
        let cost: Decimal = cost.parse().unwrap();
        let expected: Decimal = expected.parse().unwrap();
        assert_eq!(suggested_price(cost), Some(expected));
    }

    #[test]
    fn suggested_price_undefined_without_cost() {
        assert_eq!(suggested_price(Decimal::ZERO), None);
        assert_eq!(suggested_price(dec!(-1)), None);
    }
}
