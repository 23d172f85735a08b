use sea_orm_migration::prelude::*;

use super::m20250601_000001_create_products_table::Products;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProductFlavors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductFlavors::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProductFlavors::ProductId).uuid().not_null())
                    .col(
                        ColumnDef::new(ProductFlavors::Flavor)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductFlavors::Quantity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ProductFlavors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductFlavors::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_flavors_product")
                            .from(ProductFlavors::Table, ProductFlavors::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One row per (product, flavor label) pair
        manager
            .create_index(
                Index::create()
                    .name("idx_product_flavors_product_flavor")
                    .table(ProductFlavors::Table)
                    .col(ProductFlavors::ProductId)
                    .col(ProductFlavors::Flavor)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProductFlavors::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ProductFlavors {
    Table,
    Id,
    ProductId,
    Flavor,
    Quantity,
    CreatedAt,
    UpdatedAt,
}
