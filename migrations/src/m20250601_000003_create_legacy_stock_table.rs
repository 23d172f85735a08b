use sea_orm_migration::prelude::*;

use super::m20250601_000001_create_products_table::Products;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Per-product aggregate quantity kept in sync with product_flavors.
        manager
            .create_table(
                Table::create()
                    .table(LegacyStock::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LegacyStock::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LegacyStock::ProductId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(LegacyStock::Quantity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LegacyStock::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_legacy_stock_product")
                            .from(LegacyStock::Table, LegacyStock::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LegacyStock::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum LegacyStock {
    Table,
    Id,
    ProductId,
    Quantity,
    UpdatedAt,
}
