mod common;

use chrono::Utc;
use doceria_pos_api::entities::setting::{self, BALANCE_KEY};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait, Unchanged};

#[tokio::test]
async fn balance_starts_at_zero_and_survives_overwrite() {
    let ctx = common::setup().await;

    assert_eq!(ctx.balance.get_balance().await.unwrap().balance, dec!(0));

    let res = ctx.balance.set_balance(dec!(250.75)).await.unwrap();
    assert_eq!(res.balance, dec!(250.75));
    assert_eq!(res.currency, "BRL");
    assert_eq!(
        ctx.balance.get_balance().await.unwrap().balance,
        dec!(250.75)
    );
}

#[tokio::test]
async fn unparsable_stored_value_reads_as_zero() {
    let ctx = common::setup().await;

    let model = setting::ActiveModel {
        key: Unchanged(BALANCE_KEY.to_string()),
        value: Set("not-a-number".to_string()),
        updated_at: Set(Utc::now()),
    };
    model.update(&*ctx.db).await.unwrap();

    assert_eq!(ctx.balance.get_balance().await.unwrap().balance, dec!(0));
}

#[tokio::test]
async fn missing_row_reads_as_zero_and_is_created_on_write() {
    let ctx = common::setup().await;

    setting::Entity::delete_by_id(BALANCE_KEY.to_string())
        .exec(&*ctx.db)
        .await
        .unwrap();

    assert_eq!(ctx.balance.get_balance().await.unwrap().balance, dec!(0));

    ctx.balance.set_balance(dec!(10)).await.unwrap();
    let row = setting::Entity::find_by_id(BALANCE_KEY.to_string())
        .one(&*ctx.db)
        .await
        .unwrap();
    assert!(row.is_some());
}
