mod common;

use assert_matches::assert_matches;
use doceria_pos_api::entities::sale;
use doceria_pos_api::errors::ServiceError;
use doceria_pos_api::services::inventory::AddStockRequest;
use doceria_pos_api::services::sales::{
    CreateCustomSaleRequest, CreateSaleRequest, SaleLineRequest,
};
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use uuid::Uuid;

const CASHIER: &str = "ana@doceria.test";

async fn stock(ctx: &common::TestContext, product: &str, flavor: &str, qty: i32, price: &str) -> Uuid {
    ctx.inventory
        .add_stock(AddStockRequest {
            product_name: product.to_string(),
            flavor: flavor.to_string(),
            quantity: qty,
            cost_price: None,
            sale_price: Some(price.parse().unwrap()),
            allow_negative_balance: false,
        })
        .await
        .unwrap()
        .flavor_id
}

#[tokio::test]
async fn standard_sale_decrements_stock_and_credits_balance() {
    let ctx = common::setup().await;
    let brigadeiro = stock(&ctx, "Brigadeiro", "Classico", 10, "5").await;
    let trufa = stock(&ctx, "Trufa", "Maracuja", 4, "8").await;

    let sale = ctx
        .sales
        .create_sale(
            CASHIER,
            CreateSaleRequest {
                items: vec![
                    SaleLineRequest {
                        flavor_id: brigadeiro,
                        quantity: 3,
                    },
                    SaleLineRequest {
                        flavor_id: trufa,
                        quantity: 2,
                    },
                ],
            },
        )
        .await
        .unwrap();

    assert_eq!(sale.total, dec!(31)); // 3*5 + 2*8
    assert_eq!(sale.cashier_email, CASHIER);
    assert_eq!(sale.note, None);
    assert_eq!(sale.items.len(), 2);
    let brigadeiro_line = sale
        .items
        .iter()
        .find(|i| i.flavor_id == brigadeiro)
        .unwrap();
    assert_eq!(brigadeiro_line.product_name, "Brigadeiro");
    assert_eq!(brigadeiro_line.subtotal, dec!(15));

    let rows = ctx.inventory.list().await.unwrap();
    assert_eq!(
        rows.iter().find(|r| r.flavor_id == brigadeiro).unwrap().quantity,
        7
    );
    assert_eq!(rows.iter().find(|r| r.flavor_id == trufa).unwrap().quantity, 2);

    assert_eq!(ctx.balance.get_balance().await.unwrap().balance, dec!(31));
}

#[tokio::test]
async fn oversell_is_rejected_and_rolls_back() {
    let ctx = common::setup().await;
    let flavor = stock(&ctx, "Brigadeiro", "Classico", 2, "5").await;

    let err = ctx
        .sales
        .create_sale(
            CASHIER,
            CreateSaleRequest {
                items: vec![SaleLineRequest {
                    flavor_id: flavor,
                    quantity: 3,
                }],
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(msg) => {
        assert!(msg.contains("Brigadeiro"));
        assert!(msg.contains("Classico"));
    });

    // Nothing committed
    assert!(sale::Entity::find().all(&*ctx.db).await.unwrap().is_empty());
    let rows = ctx.inventory.list().await.unwrap();
    assert_eq!(rows[0].quantity, 2);
    assert_eq!(ctx.balance.get_balance().await.unwrap().balance, dec!(0));
}

#[tokio::test]
async fn duplicate_flavor_lines_are_invalid() {
    let ctx = common::setup().await;
    let flavor = stock(&ctx, "Brigadeiro", "Classico", 10, "5").await;

    let err = ctx
        .sales
        .create_sale(
            CASHIER,
            CreateSaleRequest {
                items: vec![
                    SaleLineRequest {
                        flavor_id: flavor,
                        quantity: 1,
                    },
                    SaleLineRequest {
                        flavor_id: flavor,
                        quantity: 2,
                    },
                ],
            },
        )
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::InvalidInput(_));
}

#[tokio::test]
async fn empty_sale_and_unknown_flavor_are_rejected() {
    let ctx = common::setup().await;

    let err = ctx
        .sales
        .create_sale(CASHIER, CreateSaleRequest { items: vec![] })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let err = ctx
        .sales
        .create_sale(
            CASHIER,
            CreateSaleRequest {
                items: vec![SaleLineRequest {
                    flavor_id: Uuid::new_v4(),
                    quantity: 1,
                }],
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn custom_sale_persists_the_note() {
    let ctx = common::setup().await;
    let flavor = stock(&ctx, "Trufa", "Pistache", 1, "8").await;

    let sale = ctx
        .sales
        .create_custom_sale(
            CASHIER,
            CreateCustomSaleRequest {
                flavor_id: flavor,
                price: dec!(6.50),
                reason: "  damaged wrapper discount  ".into(),
            },
        )
        .await
        .unwrap();

    assert_eq!(sale.total, dec!(6.50));
    assert_eq!(sale.note.as_deref(), Some("damaged wrapper discount"));
    assert_eq!(sale.items.len(), 1);
    assert_eq!(sale.items[0].quantity, 1);
    assert_eq!(sale.items[0].unit_price, dec!(6.50));

    // The flavor is now out of stock, a second custom sale fails
    let err = ctx
        .sales
        .create_custom_sale(
            CASHIER,
            CreateCustomSaleRequest {
                flavor_id: flavor,
                price: dec!(6.50),
                reason: "again".into(),
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(_));

    assert_eq!(ctx.balance.get_balance().await.unwrap().balance, dec!(6.50));
}

#[tokio::test]
async fn custom_sale_requires_positive_price_and_reason() {
    let ctx = common::setup().await;
    let flavor = stock(&ctx, "Trufa", "Limao", 5, "8").await;

    let err = ctx
        .sales
        .create_custom_sale(
            CASHIER,
            CreateCustomSaleRequest {
                flavor_id: flavor,
                price: dec!(0),
                reason: "free".into(),
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let err = ctx
        .sales
        .create_custom_sale(
            CASHIER,
            CreateCustomSaleRequest {
                flavor_id: flavor,
                price: dec!(5),
                reason: "   ".into(),
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn history_is_paginated_newest_first() {
    let ctx = common::setup().await;
    let flavor = stock(&ctx, "Brigadeiro", "Classico", 10, "5").await;

    for _ in 0..3 {
        ctx.sales
            .create_sale(
                CASHIER,
                CreateSaleRequest {
                    items: vec![SaleLineRequest {
                        flavor_id: flavor,
                        quantity: 1,
                    }],
                },
            )
            .await
            .unwrap();
    }

    let page = ctx.sales.list_sales(1, 2).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.sales.len(), 2);
    assert!(page.sales[0].recorded_at >= page.sales[1].recorded_at);
    assert_eq!(page.sales[0].items.len(), 1);

    let page2 = ctx.sales.list_sales(2, 2).await.unwrap();
    assert_eq!(page2.sales.len(), 1);
}

#[tokio::test]
async fn summary_reports_count_gross_and_average() {
    let ctx = common::setup().await;

    let empty = ctx.sales.sales_summary().await.unwrap();
    assert_eq!(empty.count, 0);
    assert_eq!(empty.gross_total, dec!(0));
    assert_eq!(empty.average_ticket, dec!(0));

    let flavor = stock(&ctx, "Brigadeiro", "Classico", 10, "5").await;
    ctx.sales
        .create_sale(
            CASHIER,
            CreateSaleRequest {
                items: vec![SaleLineRequest {
                    flavor_id: flavor,
                    quantity: 2,
                }],
            },
        )
        .await
        .unwrap();
    ctx.sales
        .create_custom_sale(
            CASHIER,
            CreateCustomSaleRequest {
                flavor_id: flavor,
                price: dec!(7),
                reason: "loyal customer".into(),
            },
        )
        .await
        .unwrap();

    let summary = ctx.sales.sales_summary().await.unwrap();
    assert_eq!(summary.count, 2);
    assert_eq!(summary.gross_total, dec!(17));
    assert_eq!(summary.average_ticket, dec!(8.50));
}

#[tokio::test]
async fn get_sale_returns_items_or_not_found() {
    let ctx = common::setup().await;
    let flavor = stock(&ctx, "Brigadeiro", "Classico", 5, "5").await;

    let created = ctx
        .sales
        .create_sale(
            CASHIER,
            CreateSaleRequest {
                items: vec![SaleLineRequest {
                    flavor_id: flavor,
                    quantity: 1,
                }],
            },
        )
        .await
        .unwrap();

    let fetched = ctx.sales.get_sale(created.id).await.unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.items.len(), 1);

    let err = ctx.sales.get_sale(Uuid::new_v4()).await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn history_survives_inventory_deletion() {
    let ctx = common::setup().await;
    let flavor = stock(&ctx, "Trufa", "Maracuja", 3, "8").await;

    let created = ctx
        .sales
        .create_sale(
            CASHIER,
            CreateSaleRequest {
                items: vec![SaleLineRequest {
                    flavor_id: flavor,
                    quantity: 1,
                }],
            },
        )
        .await
        .unwrap();

    ctx.inventory.remove_flavor(flavor).await.unwrap();

    let fetched = ctx.sales.get_sale(created.id).await.unwrap();
    assert_eq!(fetched.items[0].product_name, "Trufa");
    assert_eq!(fetched.items[0].flavor, "Maracuja");
}
