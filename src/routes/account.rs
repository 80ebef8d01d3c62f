use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::account::{
        AddressRequest, ChangePasswordRequest, PaymentMethodRequest, UpdateProfileRequest,
        UserLookup, UserLookupQuery,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Address, PaymentMethod, User},
    response::ApiResponse,
    services::{account_service, admin_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile/{id}", get(get_profile).put(update_profile))
        .route("/password/{id}", put(change_password))
        .route(
            "/profile/{id}/addresses",
            get(list_addresses).post(add_address),
        )
        .route(
            "/profile/{id}/addresses/{address_id}",
            put(update_address).delete(delete_address),
        )
        .route(
            "/profile/{id}/payments",
            get(list_payment_methods).post(add_payment_method),
        )
        .route(
            "/profile/{id}/payments/{payment_id}",
            put(update_payment_method).delete(delete_payment_method),
        )
        .route("/users/lookup", get(lookup_user))
}

#[utoipa::path(
    get,
    path = "/api/profile/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Profile", body = ApiResponse<User>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = account_service::get_profile(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/profile/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<User>),
        (status = 409, description = "Email already taken"),
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = account_service::update_profile(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/password/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password updated"),
        (status = 400, description = "Current password is incorrect"),
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = account_service::change_password(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/profile/{id}/addresses",
    params(("id" = Uuid, Path, description = "User ID")),
    responses((status = 200, description = "Address book", body = ApiResponse<Vec<Address>>)),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn list_addresses(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<Address>>>> {
    let resp = account_service::list_addresses(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/profile/{id}/addresses",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = AddressRequest,
    responses((status = 201, description = "Address added", body = ApiResponse<Address>)),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn add_address(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddressRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Address>>)> {
    let resp = account_service::add_address(&state, &user, id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/profile/{id}/addresses/{address_id}",
    params(
        ("id" = Uuid, Path, description = "User ID"),
        ("address_id" = Uuid, Path, description = "Address ID"),
    ),
    request_body = AddressRequest,
    responses(
        (status = 200, description = "Address updated in place", body = ApiResponse<Address>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn update_address(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, address_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<AddressRequest>,
) -> AppResult<Json<ApiResponse<Address>>> {
    let resp = account_service::update_address(&state, &user, id, address_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/profile/{id}/addresses/{address_id}",
    params(
        ("id" = Uuid, Path, description = "User ID"),
        ("address_id" = Uuid, Path, description = "Address ID"),
    ),
    responses(
        (status = 200, description = "Address deleted"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn delete_address(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, address_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = account_service::delete_address(&state, &user, id, address_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/profile/{id}/payments",
    params(("id" = Uuid, Path, description = "User ID")),
    responses((status = 200, description = "Saved payment methods", body = ApiResponse<Vec<PaymentMethod>>)),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn list_payment_methods(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<PaymentMethod>>>> {
    let resp = account_service::list_payment_methods(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/profile/{id}/payments",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = PaymentMethodRequest,
    responses((status = 201, description = "Payment method added", body = ApiResponse<PaymentMethod>)),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn add_payment_method(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PaymentMethodRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<PaymentMethod>>)> {
    let resp = account_service::add_payment_method(&state, &user, id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/profile/{id}/payments/{payment_id}",
    params(
        ("id" = Uuid, Path, description = "User ID"),
        ("payment_id" = Uuid, Path, description = "Payment method ID"),
    ),
    request_body = PaymentMethodRequest,
    responses(
        (status = 200, description = "Payment method updated in place", body = ApiResponse<PaymentMethod>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn update_payment_method(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, payment_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<PaymentMethodRequest>,
) -> AppResult<Json<ApiResponse<PaymentMethod>>> {
    let resp =
        account_service::update_payment_method(&state, &user, id, payment_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/profile/{id}/payments/{payment_id}",
    params(
        ("id" = Uuid, Path, description = "User ID"),
        ("payment_id" = Uuid, Path, description = "Payment method ID"),
    ),
    responses(
        (status = 200, description = "Payment method deleted"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn delete_payment_method(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, payment_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = account_service::delete_payment_method(&state, &user, id, payment_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/lookup",
    params(("email" = String, Query, description = "Customer email")),
    responses(
        (status = 200, description = "Whether a customer with this email exists", body = ApiResponse<UserLookup>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn lookup_user(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<UserLookupQuery>,
) -> AppResult<Json<ApiResponse<UserLookup>>> {
    let resp = admin_service::lookup_user(&state, &user, &query.email).await?;
    Ok(Json(resp))
}
