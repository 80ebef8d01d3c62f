use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    dto::{
        account::UserLookup,
        auth::normalize_email,
        orders::{OrderList, OrderWithItems},
    },
    entity::{
        orders::Entity as Orders,
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::order_service::{list_orders_where, with_items},
    state::AppState,
};

/// Every order, filterable by status and channel.
pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_staff(user)?;
    let (list, meta) = list_orders_where(&state.orm, Condition::all(), &query).await?;
    Ok(ApiResponse::success("Orders", list, Some(meta)))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_staff(user)?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let data = with_items(&state.orm, order).await?;
    Ok(ApiResponse::success("Order found", data, Some(Meta::empty())))
}

/// Lets till staff attach a registered customer to a sale.
pub async fn lookup_user(
    state: &AppState,
    user: &AuthUser,
    email: &str,
) -> AppResult<ApiResponse<UserLookup>> {
    ensure_staff(user)?;
    let found = match normalize_email(email) {
        Some(email) => {
            Users::find()
                .filter(UserCol::Email.eq(email))
                .one(&state.orm)
                .await?
        }
        None => None,
    };

    let data = match found {
        Some(u) => UserLookup {
            found: true,
            name: Some(u.name),
            email: Some(u.email),
        },
        None => UserLookup {
            found: false,
            name: None,
            email: None,
        },
    };
    Ok(ApiResponse::success("Lookup", data, Some(Meta::empty())))
}
