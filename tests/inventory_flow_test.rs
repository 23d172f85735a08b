mod common;

use assert_matches::assert_matches;
use doceria_pos_api::entities::{legacy_stock, product};
use doceria_pos_api::errors::ServiceError;
use doceria_pos_api::services::inventory::{AddStockRequest, UpdateFlavorRequest};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

fn add_request(product: &str, flavor: &str, quantity: i32) -> AddStockRequest {
    AddStockRequest {
        product_name: product.to_string(),
        flavor: flavor.to_string(),
        quantity,
        cost_price: None,
        sale_price: Some(dec!(10)),
        allow_negative_balance: false,
    }
}

#[tokio::test]
async fn add_stock_creates_product_and_flavor() {
    let ctx = common::setup().await;

    let res = ctx
        .inventory
        .add_stock(add_request("Brigadeiro", "Classico", 12))
        .await
        .unwrap();

    assert!(!res.merged);
    assert_eq!(res.quantity, 12);
    assert_eq!(res.applied_price, dec!(10));
    assert!(!res.used_suggested_price);
    assert_eq!(res.cost_debited, dec!(0));

    let rows = ctx.inventory.list().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].product_name, "Brigadeiro");
    assert_eq!(rows[0].quantity, 12);
}

#[tokio::test]
async fn add_stock_merges_quantities_into_existing_flavor() {
    let ctx = common::setup().await;

    ctx.inventory
        .add_stock(add_request("Brigadeiro", "Classico", 12))
        .await
        .unwrap();
    let res = ctx
        .inventory
        .add_stock(add_request("  Brigadeiro ", " Classico ", 8))
        .await
        .unwrap();

    assert!(res.merged);
    assert_eq!(res.quantity, 20);

    // One flavor row, aggregate in sync
    let rows = ctx.inventory.list().await.unwrap();
    assert_eq!(rows.len(), 1);
    let aggregate = legacy_stock::Entity::find()
        .filter(legacy_stock::Column::ProductId.eq(res.product_id))
        .one(&*ctx.db)
        .await
        .unwrap()
        .expect("aggregate row expected");
    assert_eq!(aggregate.quantity, 20);
}

#[tokio::test]
async fn suggested_price_applies_when_no_sale_price_given() {
    let ctx = common::setup().await;
    ctx.balance.set_balance(dec!(100)).await.unwrap();

    let res = ctx
        .inventory
        .add_stock(AddStockRequest {
            product_name: "Trufa".into(),
            flavor: "Maracuja".into(),
            quantity: 10,
            cost_price: Some(dec!(3.40)),
            sale_price: None,
            allow_negative_balance: false,
        })
        .await
        .unwrap();

    // 3.40 * 1.5 = 5.10, next multiple of five is 10
    assert_eq!(res.applied_price, dec!(10));
    assert!(res.used_suggested_price);
    assert_eq!(res.cost_debited, dec!(34.00));
    assert_eq!(res.balance, dec!(66.00));
}

#[tokio::test]
async fn add_stock_without_any_price_is_invalid() {
    let ctx = common::setup().await;

    let err = ctx
        .inventory
        .add_stock(AddStockRequest {
            product_name: "Trufa".into(),
            flavor: "Limao".into(),
            quantity: 5,
            cost_price: None,
            sale_price: None,
            allow_negative_balance: false,
        })
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn stock_purchase_cannot_drive_balance_negative_without_flag() {
    let ctx = common::setup().await;

    let err = ctx
        .inventory
        .add_stock(AddStockRequest {
            product_name: "Trufa".into(),
            flavor: "Morango".into(),
            quantity: 10,
            cost_price: Some(dec!(2)),
            sale_price: Some(dec!(8)),
            allow_negative_balance: false,
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));

    // Rolled back: no product row was left behind
    let products = product::Entity::find().all(&*ctx.db).await.unwrap();
    assert!(products.is_empty());
    assert_eq!(ctx.balance.get_balance().await.unwrap().balance, dec!(0));

    // Allowed when the caller opts in
    let res = ctx
        .inventory
        .add_stock(AddStockRequest {
            product_name: "Trufa".into(),
            flavor: "Morango".into(),
            quantity: 10,
            cost_price: Some(dec!(2)),
            sale_price: Some(dec!(8)),
            allow_negative_balance: true,
        })
        .await
        .unwrap();
    assert_eq!(res.balance, dec!(-20));
}

#[tokio::test]
async fn product_price_is_set_on_create_only() {
    let ctx = common::setup().await;

    let first = ctx
        .inventory
        .add_stock(add_request("Beijinho", "Coco", 5))
        .await
        .unwrap();

    let mut again = add_request("Beijinho", "Coco", 5);
    again.sale_price = Some(dec!(99));
    ctx.inventory.add_stock(again).await.unwrap();

    let rows = ctx.inventory.list().await.unwrap();
    assert_eq!(rows[0].price, first.applied_price);
}

#[tokio::test]
async fn update_flavor_debits_only_quantity_increases() {
    let ctx = common::setup().await;
    ctx.balance.set_balance(dec!(50)).await.unwrap();

    let added = ctx
        .inventory
        .add_stock(add_request("Brigadeiro", "Classico", 10))
        .await
        .unwrap();

    // Increase by 5 at unit cost 2: debit 10
    let res = ctx
        .inventory
        .update_flavor(
            added.flavor_id,
            UpdateFlavorRequest {
                flavor: "Classico".into(),
                quantity: 15,
                unit_cost: Some(dec!(2)),
                allow_negative_balance: false,
            },
        )
        .await
        .unwrap();
    assert_eq!(res.quantity, 15);
    assert_eq!(res.cost_debited, dec!(10));
    assert_eq!(res.balance, dec!(40));

    // Decrease never touches the balance, even with a unit cost present
    let res = ctx
        .inventory
        .update_flavor(
            added.flavor_id,
            UpdateFlavorRequest {
                flavor: "Classico".into(),
                quantity: 3,
                unit_cost: Some(dec!(2)),
                allow_negative_balance: false,
            },
        )
        .await
        .unwrap();
    assert_eq!(res.cost_debited, dec!(0));
    assert_eq!(res.balance, dec!(40));

    let aggregate = legacy_stock::Entity::find()
        .filter(legacy_stock::Column::ProductId.eq(added.product_id))
        .one(&*ctx.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(aggregate.quantity, 3);
}

#[tokio::test]
async fn renaming_flavor_onto_a_sibling_is_a_conflict() {
    let ctx = common::setup().await;

    ctx.inventory
        .add_stock(add_request("Brigadeiro", "Classico", 5))
        .await
        .unwrap();
    let other = ctx
        .inventory
        .add_stock(add_request("Brigadeiro", "Pistache", 5))
        .await
        .unwrap();

    let err = ctx
        .inventory
        .update_flavor(
            other.flavor_id,
            UpdateFlavorRequest {
                flavor: "Classico".into(),
                quantity: 5,
                unit_cost: None,
                allow_negative_balance: false,
            },
        )
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn removing_last_flavor_drops_the_aggregate_row() {
    let ctx = common::setup().await;

    let a = ctx
        .inventory
        .add_stock(add_request("Brigadeiro", "Classico", 5))
        .await
        .unwrap();
    let b = ctx
        .inventory
        .add_stock(add_request("Brigadeiro", "Pistache", 7))
        .await
        .unwrap();

    ctx.inventory.remove_flavor(a.flavor_id).await.unwrap();
    let aggregate = legacy_stock::Entity::find()
        .filter(legacy_stock::Column::ProductId.eq(a.product_id))
        .one(&*ctx.db)
        .await
        .unwrap()
        .expect("aggregate survives while a flavor remains");
    assert_eq!(aggregate.quantity, 7);

    ctx.inventory.remove_flavor(b.flavor_id).await.unwrap();
    let aggregate = legacy_stock::Entity::find()
        .filter(legacy_stock::Column::ProductId.eq(a.product_id))
        .one(&*ctx.db)
        .await
        .unwrap();
    assert!(aggregate.is_none());

    let err = ctx.inventory.remove_flavor(b.flavor_id).await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn adding_zero_quantity_keeps_row_and_debits_nothing() {
    let ctx = common::setup().await;

    let res = ctx
        .inventory
        .add_stock(AddStockRequest {
            product_name: "Palha Italiana".into(),
            flavor: "Tradicional".into(),
            quantity: 0,
            cost_price: Some(dec!(4)),
            sale_price: None,
            allow_negative_balance: false,
        })
        .await
        .unwrap();

    assert_eq!(res.quantity, 0);
    assert_eq!(res.cost_debited, dec!(0));
    assert_eq!(ctx.inventory.list().await.unwrap().len(), 1);
    assert!(ctx.inventory.list_available().await.unwrap().is_empty());
}
