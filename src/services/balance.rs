use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ConnectionTrait, EntityTrait, TransactionTrait,
    Unchanged,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::db::DbPool;
use crate::entities::setting::{self, BALANCE_KEY};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Reads the cash balance inside the caller's transaction. A missing row or
/// an unparsable value reads as zero.
pub(crate) async fn read_balance<C: ConnectionTrait>(conn: &C) -> Result<Decimal, ServiceError> {
    let row = setting::Entity::find_by_id(BALANCE_KEY.to_string())
        .one(conn)
        .await
        .map_err(ServiceError::DatabaseError)?;

    Ok(row
        .and_then(|r| r.value.trim().parse::<Decimal>().ok())
        .unwrap_or(Decimal::ZERO))
}

/// Writes the cash balance inside the caller's transaction, creating the
/// settings row on first write.
pub(crate) async fn write_balance<C: ConnectionTrait>(
    conn: &C,
    value: Decimal,
) -> Result<(), ServiceError> {
    let existing = setting::Entity::find_by_id(BALANCE_KEY.to_string())
        .one(conn)
        .await
        .map_err(ServiceError::DatabaseError)?;

    match existing {
        Some(_) => {
            let model = setting::ActiveModel {
                key: Unchanged(BALANCE_KEY.to_string()),
                value: Set(value.to_string()),
                updated_at: Set(Utc::now()),
            };
            model.update(conn).await.map_err(ServiceError::DatabaseError)?;
        }
        None => {
            let model = setting::ActiveModel {
                key: Set(BALANCE_KEY.to_string()),
                value: Set(value.to_string()),
                updated_at: Set(Utc::now()),
            };
            model.insert(conn).await.map_err(ServiceError::DatabaseError)?;
        }
    }

    Ok(())
}

/// Debits `amount` from the balance within the caller's transaction. Fails
/// with a conflict when the result would be negative and the caller did not
/// opt into a negative balance. Returns (old, new).
pub(crate) async fn debit_balance<C: ConnectionTrait>(
    conn: &C,
    amount: Decimal,
    allow_negative: bool,
) -> Result<(Decimal, Decimal), ServiceError> {
    let old = read_balance(conn).await?;
    let new = old - amount;

    if new < Decimal::ZERO && !allow_negative {
        return Err(ServiceError::Conflict(format!(
            "Debiting {} would leave the cash balance negative ({}); \
             set allow_negative_balance to proceed",
            amount, new
        )));
    }

    write_balance(conn, new).await?;
    Ok((old, new))
}

/// Credits `amount` to the balance within the caller's transaction.
/// Returns (old, new).
pub(crate) async fn credit_balance<C: ConnectionTrait>(
    conn: &C,
    amount: Decimal,
) -> Result<(Decimal, Decimal), ServiceError> {
    let old = read_balance(conn).await?;
    let new = old + amount;
    write_balance(conn, new).await?;
    Ok((old, new))
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BalanceResponse {
    pub balance: Decimal,
    pub currency: String,
}

/// Service exposing the cash-on-hand scalar
#[derive(Clone)]
pub struct BalanceService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
    currency: String,
}

impl BalanceService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender, currency: String) -> Self {
        Self {
            db_pool,
            event_sender,
            currency,
        }
    }

    /// Current balance; zero when the row is absent
    #[instrument(skip(self))]
    pub async fn get_balance(&self) -> Result<BalanceResponse, ServiceError> {
        let balance = read_balance(&*self.db_pool).await?;
        Ok(BalanceResponse {
            balance,
            currency: self.currency.clone(),
        })
    }

    /// Overwrites the balance, for manual corrections and opening balances
    #[instrument(skip(self), fields(new_balance = %new_balance))]
    pub async fn set_balance(&self, new_balance: Decimal) -> Result<BalanceResponse, ServiceError> {
        let txn = self.db_pool.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for balance update");
            ServiceError::DatabaseError(e)
        })?;

        let old_balance = read_balance(&txn).await?;
        write_balance(&txn, new_balance).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit balance update");
            ServiceError::DatabaseError(e)
        })?;

        info!(old = %old_balance, new = %new_balance, "Cash balance overwritten");

        self.event_sender
            .send_or_log(Event::BalanceChanged {
                old_balance,
                new_balance,
            })
            .await;

        Ok(BalanceResponse {
            balance: new_balance,
            currency: self.currency.clone(),
        })
    }
}
