use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Sales::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Sales::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Sales::CashierEmail)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Sales::Total).decimal().not_null())
                    .col(ColumnDef::new(Sales::Note).text().null())
                    .col(
                        ColumnDef::new(Sales::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // History listing is newest-first
        manager
            .create_index(
                Index::create()
                    .name("idx_sales_recorded_at")
                    .table(Sales::Table)
                    .col(Sales::RecordedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SaleItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SaleItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SaleItems::SaleId).uuid().not_null())
                    // Product/flavor ids and names are captured at sale time.
                    // Intentionally no FK to the stock tables: deleting a
                    // flavor from inventory must not erase or block history.
                    .col(ColumnDef::new(SaleItems::ProductId).uuid().not_null())
                    .col(ColumnDef::new(SaleItems::FlavorId).uuid().not_null())
                    .col(
                        ColumnDef::new(SaleItems::ProductName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(SaleItems::Flavor).string_len(255).not_null())
                    .col(ColumnDef::new(SaleItems::Quantity).integer().not_null())
                    .col(ColumnDef::new(SaleItems::UnitPrice).decimal().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sale_items_sale")
                            .from(SaleItems::Table, SaleItems::SaleId)
                            .to(Sales::Table, Sales::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sale_items_sale_id")
                    .table(SaleItems::Table)
                    .col(SaleItems::SaleId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SaleItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sales::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Sales {
    Table,
    Id,
    CashierEmail,
    Total,
    Note,
    RecordedAt,
}

#[derive(DeriveIden)]
pub enum SaleItems {
    Table,
    Id,
    SaleId,
    ProductId,
    FlavorId,
    ProductName,
    Flavor,
    Quantity,
    UnitPrice,
}
