mod common;

use common::{create_user, setup_state};
use history_keepers_api::{
    dto::{
        account::{AddressRequest, ChangePasswordRequest, PaymentMethodRequest, UpdateProfileRequest},
        auth::{LoginRequest, RegisterRequest},
    },
    entity::{
        audit_logs::{Column as AuditCol, Entity as AuditLogs},
        users::UserRole,
    },
    error::AppError,
    middleware::auth::AuthUser,
    services::{account_service, admin_service, auth_service},
    state::AppState,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, Uuid::new_v4().simple())
}

/// Registers a buyer through the service so the stored hash is real.
async fn register(state: &AppState, email: &str, password: &str) -> anyhow::Result<AuthUser> {
    let user = auth_service::register_user(
        state,
        RegisterRequest {
            name: "Terrace regular".into(),
            email: email.into(),
            password: password.into(),
        },
    )
    .await?
    .data
    .expect("user");
    assert_eq!(user.role, UserRole::Buyer);
    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
}

async fn login(state: &AppState, email: &str, password: &str) -> Result<String, AppError> {
    let resp = auth_service::login_user(
        state,
        LoginRequest {
            email: email.into(),
            password: password.into(),
        },
    )
    .await?;
    Ok(resp.data.expect("login").token)
}

fn home_address(street: &str) -> AddressRequest {
    AddressRequest {
        label: Some("Home".into()),
        street: street.into(),
        city: "Montevideo".into(),
        state: None,
        postal_code: "11200".into(),
        country: "UY".into(),
        phone: None,
    }
}

fn card(number: &str, holder: &str) -> PaymentMethodRequest {
    PaymentMethodRequest {
        brand: "Visa".into(),
        holder_name: holder.into(),
        card_number: number.into(),
        exp_month: 8,
        exp_year: 2030,
    }
}

async fn audited(state: &AppState, user: &AuthUser, action: &str) -> anyhow::Result<usize> {
    let rows = AuditLogs::find()
        .filter(AuditCol::UserId.eq(user.user_id))
        .filter(AuditCol::Action.eq(action))
        .all(&state.orm)
        .await?;
    Ok(rows.len())
}

#[tokio::test]
async fn register_then_login_and_reject_duplicates() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let email = unique_email("fan");
    register(&state, &email, "secret1").await?;

    let err = register(&state, &email.to_uppercase(), "secret1")
        .await
        .expect_err("email is taken");
    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::Conflict(_))
    ));

    let token = login(&state, &email, "secret1").await?;
    assert!(token.starts_with("Bearer "));

    let err = login(&state, &email, "wrong-password")
        .await
        .expect_err("bad credentials");
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = auth_service::register_user(
        &state,
        RegisterRequest {
            name: "Short".into(),
            email: unique_email("short"),
            password: "12345".into(),
        },
    )
    .await
    .expect_err("password too short");
    assert!(matches!(err, AppError::Validation(_)));

    Ok(())
}

#[tokio::test]
async fn password_change_requires_the_current_password() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let email = unique_email("fan");
    let buyer = register(&state, &email, "old-secret").await?;

    let err = account_service::change_password(
        &state,
        &buyer,
        buyer.user_id,
        ChangePasswordRequest {
            current_password: "not-it".into(),
            new_password: "new-secret".into(),
        },
    )
    .await
    .expect_err("wrong current password");
    assert!(matches!(err, AppError::BadRequest(_)));
    login(&state, &email, "old-secret").await?;

    account_service::change_password(
        &state,
        &buyer,
        buyer.user_id,
        ChangePasswordRequest {
            current_password: "old-secret".into(),
            new_password: "new-secret".into(),
        },
    )
    .await?;
    assert!(matches!(
        login(&state, &email, "old-secret").await,
        Err(AppError::BadRequest(_))
    ));
    login(&state, &email, "new-secret").await?;
    assert_eq!(audited(&state, &buyer, "password_change").await?, 1);

    Ok(())
}

#[tokio::test]
async fn profile_email_must_stay_unique() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let buyer = register(&state, &unique_email("fan"), "secret1").await?;
    let other_email = unique_email("other");
    register(&state, &other_email, "secret1").await?;

    let err = account_service::update_profile(
        &state,
        &buyer,
        buyer.user_id,
        UpdateProfileRequest {
            name: None,
            email: Some(other_email),
        },
    )
    .await
    .expect_err("email is taken");
    assert!(matches!(err, AppError::Conflict(_)));

    let updated = account_service::update_profile(
        &state,
        &buyer,
        buyer.user_id,
        UpdateProfileRequest {
            name: Some(" Season ticket holder ".into()),
            email: None,
        },
    )
    .await?
    .data
    .expect("user");
    assert_eq!(updated.name, "Season ticket holder");

    Ok(())
}

// PUT keeps the address id; a second delete finds nothing; strangers are refused.
#[tokio::test]
async fn address_book_updates_in_place() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let buyer = create_user(&state, UserRole::Buyer).await?;
    let stranger = create_user(&state, UserRole::Buyer).await?;
    let admin = create_user(&state, UserRole::Admin).await?;

    let added = account_service::add_address(
        &state,
        &buyer,
        buyer.user_id,
        home_address("Av. 18 de Julio 1000"),
    )
    .await?
    .data
    .expect("address");

    let updated = account_service::update_address(
        &state,
        &buyer,
        buyer.user_id,
        added.id,
        home_address("Bulevar Artigas 2500"),
    )
    .await?
    .data
    .expect("address");
    assert_eq!(updated.id, added.id);
    assert_eq!(updated.street, "Bulevar Artigas 2500");

    let listed = account_service::list_addresses(&state, &admin, buyer.user_id)
        .await?
        .data
        .expect("addresses");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, added.id);

    let err = account_service::list_addresses(&state, &stranger, buyer.user_id)
        .await
        .expect_err("not their address book");
    assert!(matches!(err, AppError::Forbidden));
    let err = account_service::delete_address(&state, &stranger, buyer.user_id, added.id)
        .await
        .expect_err("not their address");
    assert!(matches!(err, AppError::Forbidden));

    account_service::delete_address(&state, &buyer, buyer.user_id, added.id).await?;
    let err = account_service::delete_address(&state, &buyer, buyer.user_id, added.id)
        .await
        .expect_err("already deleted");
    assert!(matches!(err, AppError::NotFound));

    assert_eq!(audited(&state, &buyer, "address_create").await?, 1);
    assert_eq!(audited(&state, &buyer, "address_update").await?, 1);
    assert_eq!(audited(&state, &buyer, "address_delete").await?, 1);

    Ok(())
}

#[tokio::test]
async fn saved_cards_keep_only_the_last_four_digits() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let buyer = create_user(&state, UserRole::Buyer).await?;

    let added = account_service::add_payment_method(
        &state,
        &buyer,
        buyer.user_id,
        card("4111 1111 1111 1111", "A. Recoba"),
    )
    .await?
    .data
    .expect("card");
    assert_eq!(added.last4, "1111");

    let updated = account_service::update_payment_method(
        &state,
        &buyer,
        buyer.user_id,
        added.id,
        card("5500000000000004", "A. Recoba"),
    )
    .await?
    .data
    .expect("card");
    assert_eq!(updated.id, added.id);
    assert_eq!(updated.last4, "0004");

    let err = account_service::update_payment_method(
        &state,
        &buyer,
        buyer.user_id,
        Uuid::new_v4(),
        card("5500000000000004", "A. Recoba"),
    )
    .await
    .expect_err("unknown card");
    assert!(matches!(err, AppError::NotFound));

    account_service::delete_payment_method(&state, &buyer, buyer.user_id, added.id).await?;
    let err = account_service::delete_payment_method(&state, &buyer, buyer.user_id, added.id)
        .await
        .expect_err("already deleted");
    assert!(matches!(err, AppError::NotFound));

    assert_eq!(audited(&state, &buyer, "payment_method_create").await?, 1);
    assert_eq!(audited(&state, &buyer, "payment_method_update").await?, 1);
    assert_eq!(audited(&state, &buyer, "payment_method_delete").await?, 1);

    Ok(())
}

#[tokio::test]
async fn staff_can_look_up_customers_by_email() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let worker = create_user(&state, UserRole::Worker).await?;
    let email = unique_email("walkin");
    let buyer = register(&state, &email, "secret1").await?;

    let hit = admin_service::lookup_user(&state, &worker, &format!("  {}  ", email.to_uppercase()))
        .await?
        .data
        .expect("lookup");
    assert!(hit.found);
    assert_eq!(hit.email.as_deref(), Some(email.as_str()));

    let miss = admin_service::lookup_user(&state, &worker, &unique_email("nobody"))
        .await?
        .data
        .expect("lookup");
    assert!(!miss.found);
    assert!(miss.name.is_none());

    let err = admin_service::lookup_user(&state, &buyer, &email)
        .await
        .expect_err("buyers are not staff");
    assert!(matches!(err, AppError::Forbidden));

    Ok(())
}
