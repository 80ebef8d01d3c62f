use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        account::{
            AddressRequest, ChangePasswordRequest, PaymentMethodRequest, UpdateProfileRequest,
        },
        auth::normalize_email,
    },
    entity::{
        addresses::{ActiveModel as AddressActive, Column as AddressCol, Entity as Addresses},
        payment_methods::{
            ActiveModel as PaymentActive, Column as PaymentCol, Entity as PaymentMethods,
        },
        users::{ActiveModel as UserActive, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult, unique_violation},
    middleware::auth::{AuthUser, ensure_owner_or_admin},
    models::{Address, PaymentMethod, User},
    response::{ApiResponse, Meta},
    services::auth_service::{hash_password, validate_password, verify_password},
    state::AppState,
};

pub async fn get_profile(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<User>> {
    ensure_owner_or_admin(user, id)?;
    let profile = find_user(state, id).await?;
    Ok(ApiResponse::success("Profile", User::from(profile), None))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_owner_or_admin(user, id)?;
    let existing = find_user(state, id).await?;

    let mut active: UserActive = existing.into();
    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::validation("name must not be empty"));
        }
        active.name = Set(name);
    }
    if let Some(email) = payload.email {
        let email =
            normalize_email(&email).ok_or_else(|| AppError::validation("email is invalid"))?;
        active.email = Set(email);
    }

    let updated = active
        .update(&state.orm)
        .await
        .map_err(|err| unique_violation(err, "Email is already taken"))?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "profile_update",
        "users",
        serde_json::json!({ "user_id": id }),
    )
    .await;

    Ok(ApiResponse::success("Profile updated", User::from(updated), Some(Meta::empty())))
}

pub async fn change_password(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ChangePasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_owner_or_admin(user, id)?;
    validate_password(&payload.new_password)?;
    let existing = find_user(state, id).await?;

    if !verify_password(&payload.current_password, &existing.password_hash)? {
        return Err(AppError::BadRequest("Current password is incorrect".into()));
    }

    let mut active: UserActive = existing.into();
    active.password_hash = Set(hash_password(&payload.new_password)?);
    active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "password_change",
        "users",
        serde_json::json!({ "user_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Password updated",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_addresses(
    state: &AppState,
    user: &AuthUser,
    owner_id: Uuid,
) -> AppResult<ApiResponse<Vec<Address>>> {
    ensure_owner_or_admin(user, owner_id)?;
    let items = Addresses::find()
        .filter(AddressCol::UserId.eq(owner_id))
        .order_by_asc(AddressCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Address::from)
        .collect();
    Ok(ApiResponse::success("Addresses", items, None))
}

pub async fn add_address(
    state: &AppState,
    user: &AuthUser,
    owner_id: Uuid,
    payload: AddressRequest,
) -> AppResult<ApiResponse<Address>> {
    ensure_owner_or_admin(user, owner_id)?;
    let payload = payload.validate()?;
    find_user(state, owner_id).await?;

    let address = AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(owner_id),
        label: Set(payload.label),
        street: Set(payload.street),
        city: Set(payload.city),
        state: Set(payload.state),
        postal_code: Set(payload.postal_code),
        country: Set(payload.country),
        phone: Set(payload.phone),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "address_create",
        "addresses",
        serde_json::json!({ "user_id": owner_id, "address_id": address.id }),
    )
    .await;

    Ok(ApiResponse::success("Address added", Address::from(address), Some(Meta::empty())))
}

/// In-place update; the address keeps its identifier.
pub async fn update_address(
    state: &AppState,
    user: &AuthUser,
    owner_id: Uuid,
    address_id: Uuid,
    payload: AddressRequest,
) -> AppResult<ApiResponse<Address>> {
    ensure_owner_or_admin(user, owner_id)?;
    let payload = payload.validate()?;

    let existing = Addresses::find_by_id(address_id)
        .filter(AddressCol::UserId.eq(owner_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: AddressActive = existing.into();
    active.label = Set(payload.label);
    active.street = Set(payload.street);
    active.city = Set(payload.city);
    active.state = Set(payload.state);
    active.postal_code = Set(payload.postal_code);
    active.country = Set(payload.country);
    active.phone = Set(payload.phone);
    active.updated_at = Set(Utc::now().into());
    let address = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "address_update",
        "addresses",
        serde_json::json!({ "user_id": owner_id, "address_id": address.id }),
    )
    .await;

    Ok(ApiResponse::success("Address updated", Address::from(address), Some(Meta::empty())))
}

pub async fn delete_address(
    state: &AppState,
    user: &AuthUser,
    owner_id: Uuid,
    address_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_owner_or_admin(user, owner_id)?;
    let result = Addresses::delete_many()
        .filter(AddressCol::Id.eq(address_id))
        .filter(AddressCol::UserId.eq(owner_id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "address_delete",
        "addresses",
        serde_json::json!({ "user_id": owner_id, "address_id": address_id }),
    )
    .await;
    Ok(ApiResponse::success("Deleted", serde_json::json!({}), Some(Meta::empty())))
}

pub async fn list_payment_methods(
    state: &AppState,
    user: &AuthUser,
    owner_id: Uuid,
) -> AppResult<ApiResponse<Vec<PaymentMethod>>> {
    ensure_owner_or_admin(user, owner_id)?;
    let items = PaymentMethods::find()
        .filter(PaymentCol::UserId.eq(owner_id))
        .order_by_asc(PaymentCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(PaymentMethod::from)
        .collect();
    Ok(ApiResponse::success("Payment methods", items, None))
}

pub async fn add_payment_method(
    state: &AppState,
    user: &AuthUser,
    owner_id: Uuid,
    payload: PaymentMethodRequest,
) -> AppResult<ApiResponse<PaymentMethod>> {
    ensure_owner_or_admin(user, owner_id)?;
    let card = payload.validate()?;
    find_user(state, owner_id).await?;

    let method = PaymentActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(owner_id),
        brand: Set(card.brand),
        holder_name: Set(card.holder_name),
        last4: Set(card.last4),
        exp_month: Set(card.exp_month),
        exp_year: Set(card.exp_year),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "payment_method_create",
        "payment_methods",
        serde_json::json!({ "user_id": owner_id, "payment_method_id": method.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment method added",
        PaymentMethod::from(method),
        Some(Meta::empty()),
    ))
}

/// In-place update; the payment method keeps its identifier.
pub async fn update_payment_method(
    state: &AppState,
    user: &AuthUser,
    owner_id: Uuid,
    payment_id: Uuid,
    payload: PaymentMethodRequest,
) -> AppResult<ApiResponse<PaymentMethod>> {
    ensure_owner_or_admin(user, owner_id)?;
    let card = payload.validate()?;

    let existing = PaymentMethods::find_by_id(payment_id)
        .filter(PaymentCol::UserId.eq(owner_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: PaymentActive = existing.into();
    active.brand = Set(card.brand);
    active.holder_name = Set(card.holder_name);
    active.last4 = Set(card.last4);
    active.exp_month = Set(card.exp_month);
    active.exp_year = Set(card.exp_year);
    active.updated_at = Set(Utc::now().into());
    let method = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "payment_method_update",
        "payment_methods",
        serde_json::json!({ "user_id": owner_id, "payment_method_id": method.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment method updated",
        PaymentMethod::from(method),
        Some(Meta::empty()),
    ))
}

pub async fn delete_payment_method(
    state: &AppState,
    user: &AuthUser,
    owner_id: Uuid,
    payment_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_owner_or_admin(user, owner_id)?;
    let result = PaymentMethods::delete_many()
        .filter(PaymentCol::Id.eq(payment_id))
        .filter(PaymentCol::UserId.eq(owner_id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "payment_method_delete",
        "payment_methods",
        serde_json::json!({ "user_id": owner_id, "payment_method_id": payment_id }),
    )
    .await;
    Ok(ApiResponse::success("Deleted", serde_json::json!({}), Some(Meta::empty())))
}

async fn find_user(state: &AppState, id: Uuid) -> AppResult<UserModel> {
    Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}
