use std::sync::Arc;

use doceria_pos_api::db::DbPool;
use doceria_pos_api::events::EventSender;
use doceria_pos_api::services::{BalanceService, InventoryService, SalesService};
use migrations::{Migrator, MigratorTrait};
use sea_orm::Database;
use tokio::sync::mpsc;

pub struct TestContext {
    pub db: Arc<DbPool>,
    pub inventory: InventoryService,
    pub sales: SalesService,
    pub balance: BalanceService,
}

/// Fresh in-memory database with the embedded migrations applied and the
/// service layer wired to a drained event channel.
pub async fn setup() -> TestContext {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite should connect");
    Migrator::up(&db, None)
        .await
        .expect("migrations should apply");

    let (tx, mut rx) = mpsc::channel(64);
    tokio::spawn(async move { while rx.recv().await.is_some() {} });
    let events = EventSender::new(tx);

    let db = Arc::new(db);
    TestContext {
        inventory: InventoryService::new(db.clone(), events.clone()),
        sales: SalesService::new(db.clone(), events.clone()),
        balance: BalanceService::new(db.clone(), events, "BRL".to_string()),
        db,
    }
}
