pub use sea_orm_migration::prelude::*;

mod m20250601_000001_create_products_table;
mod m20250601_000002_create_product_flavors_table;
mod m20250601_000003_create_legacy_stock_table;
mod m20250601_000004_create_sales_tables;
mod m20250601_000005_create_settings_table;
mod m20250601_000006_create_auth_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_products_table::Migration),
            Box::new(m20250601_000002_create_product_flavors_table::Migration),
            Box::new(m20250601_000003_create_legacy_stock_table::Migration),
            Box::new(m20250601_000004_create_sales_tables::Migration),
            Box::new(m20250601_000005_create_settings_table::Migration),
            Box::new(m20250601_000006_create_auth_tables::Migration),
        ]
    }
}
