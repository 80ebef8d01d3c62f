mod common;

use common::{create_product, create_user, product_status, setup_state};
use history_keepers_api::{
    dto::{orders::CustomerSnapshot, pos::PosSaleRequest},
    entity::users::UserRole,
    error::AppError,
    lifecycle::{OrderStatus, ProductStatus, SalesChannel},
    pos::WALK_IN_CUSTOMER,
    routes::params::ProductQuery,
    services::{pos_service, product_service},
};

fn sale(items: Vec<uuid::Uuid>) -> PosSaleRequest {
    PosSaleRequest {
        items,
        payment_method: "cash".into(),
        customer: None,
    }
}

#[tokio::test]
async fn till_sale_marks_product_sold() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let manager = create_user(&state, UserRole::Manager).await?;
    let worker = create_user(&state, UserRole::Worker).await?;
    let cap = create_product(&state, &manager, "Cap", 200, "Hats").await?;

    let listed = product_service::list_products(
        &state,
        ProductQuery {
            search: Some("Cap".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("products");
    let entry = listed
        .items
        .iter()
        .find(|p| p.id == cap.id)
        .expect("new product is listed");
    assert_eq!(entry.status, ProductStatus::Available);

    let sold = pos_service::record_sale(&state, &worker, sale(vec![cap.id]))
        .await?
        .data
        .expect("sale");
    assert_eq!(sold.order.channel, SalesChannel::InStore);
    assert_eq!(sold.order.status, OrderStatus::Delivered);
    assert_eq!(sold.order.total, 200);
    assert_eq!(sold.order.shipping_cost, 0);
    assert_eq!(sold.order.customer_name, WALK_IN_CUSTOMER);
    assert_eq!(sold.order.payment_method.as_deref(), Some("cash"));
    assert_eq!(product_status(&state, cap.id).await?, ProductStatus::Sold);

    let available = product_service::list_products(
        &state,
        ProductQuery {
            search: Some("Cap".into()),
            status: Some(ProductStatus::Available),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("products");
    assert!(available.items.iter().all(|p| p.id != cap.id));

    let err = pos_service::open_session(&state, &[cap.id])
        .await
        .expect_err("sold products cannot be rung up again");
    assert!(matches!(err, AppError::Conflict(_)));

    Ok(())
}

#[tokio::test]
async fn till_sale_applies_discount_and_attaches_known_customer() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let manager = create_user(&state, UserRole::Manager).await?;
    let worker = create_user(&state, UserRole::Worker).await?;
    let buyer = create_user(&state, UserRole::Buyer).await?;
    let buyer_email = history_keepers_api::services::account_service::get_profile(
        &state,
        &buyer,
        buyer.user_id,
    )
    .await?
    .data
    .expect("profile")
    .email;

    let mut scarf = create_product(&state, &manager, "Derby scarf", 1_000, "Scarves").await?;
    scarf = product_service::update_product(
        &state,
        &manager,
        scarf.id,
        history_keepers_api::dto::products::UpdateProductRequest {
            discount: Some(25),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("product");
    assert_eq!(scarf.discount, 25);

    let sold = pos_service::record_sale(
        &state,
        &worker,
        PosSaleRequest {
            items: vec![scarf.id],
            payment_method: "card".into(),
            customer: Some(CustomerSnapshot {
                name: Some("Regular".into()),
                email: Some(buyer_email.to_uppercase()),
                address: None,
            }),
        },
    )
    .await?
    .data
    .expect("sale");
    assert_eq!(sold.items[0].unit_price, 750);
    assert_eq!(sold.order.total, 750);
    assert_eq!(sold.order.customer_id, Some(buyer.user_id));
    assert_eq!(sold.order.customer_name, "Regular");

    Ok(())
}

#[tokio::test]
async fn buyers_cannot_use_the_till() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let manager = create_user(&state, UserRole::Manager).await?;
    let buyer = create_user(&state, UserRole::Buyer).await?;
    let pin = create_product(&state, &manager, "Enamel pin", 150, "Pins").await?;

    let err = pos_service::record_sale(&state, &buyer, sale(vec![pin.id]))
        .await
        .expect_err("buyers are not staff");
    assert!(matches!(err, AppError::Forbidden));
    assert_eq!(product_status(&state, pin.id).await?, ProductStatus::Available);

    Ok(())
}

// Two tills ring up the same product at once: exactly one sale goes through.
#[tokio::test]
async fn concurrent_sales_of_one_product_sell_it_once() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let manager = create_user(&state, UserRole::Manager).await?;
    let till_a = create_user(&state, UserRole::Worker).await?;
    let till_b = create_user(&state, UserRole::Worker).await?;
    let ball = create_product(&state, &manager, "Final match ball", 8_000, "Balls").await?;

    let (a, b) = tokio::join!(
        pos_service::record_sale(&state, &till_a, sale(vec![ball.id])),
        pos_service::record_sale(&state, &till_b, sale(vec![ball.id])),
    );

    let outcomes = [a.is_ok(), b.is_ok()];
    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
    let loser = if a.is_ok() { b } else { a };
    assert!(matches!(loser, Err(AppError::Conflict(_))));
    assert_eq!(product_status(&state, ball.id).await?, ProductStatus::Sold);

    Ok(())
}

#[tokio::test]
async fn stale_ticket_is_rejected_and_kept() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let manager = create_user(&state, UserRole::Manager).await?;
    let till_a = create_user(&state, UserRole::Worker).await?;
    let till_b = create_user(&state, UserRole::Worker).await?;
    let flag = create_product(&state, &manager, "Corner flag", 600, "Memorabilia").await?;
    let mug = create_product(&state, &manager, "Stadium mug", 400, "Memorabilia").await?;

    let mut session = pos_service::open_session(&state, &[flag.id, mug.id]).await?;
    assert_eq!(session.total(), 1_000);

    pos_service::record_sale(&state, &till_b, sale(vec![flag.id])).await?;

    let err = pos_service::finalize(&state, &till_a, &mut session, None, "cash")
        .await
        .expect_err("flag was sold by the other till");
    assert!(matches!(err, AppError::Conflict(_)));
    assert!(session.contains(flag.id));
    assert!(session.contains(mug.id));
    assert_eq!(product_status(&state, mug.id).await?, ProductStatus::Available);

    session.remove(flag.id)?;
    let sold = pos_service::finalize(&state, &till_a, &mut session, None, "cash").await?;
    assert_eq!(sold.order.total, 400);
    assert!(session.is_empty());

    Ok(())
}
