pub mod balance;
pub mod common;
pub mod inventory;
pub mod sales;

use std::sync::Arc;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{BalanceService, InventoryService, SalesService};

pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub inventory: Arc<InventoryService>,
    pub sales: Arc<SalesService>,
    pub balance: Arc<BalanceService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender, currency: String) -> Self {
        Self {
            inventory: Arc::new(InventoryService::new(db_pool.clone(), event_sender.clone())),
            sales: Arc::new(SalesService::new(db_pool.clone(), event_sender.clone())),
            balance: Arc::new(BalanceService::new(db_pool, event_sender, currency)),
        }
    }
}
