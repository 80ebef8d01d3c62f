use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{
        CreateOrderRequest, OrderList, OrderWithItems, UpdateOrderStatusRequest, ValidatedOrder,
        build_order_number,
    },
    entity::{
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        users::Entity as Users,
    },
    error::{AppError, AppResult, unique_violation},
    lifecycle::{OrderStatus, SalesChannel},
    middleware::auth::{AuthUser, ensure_staff},
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::product_service::transition_products,
    state::AppState,
};

/// Checkout and staff-entered orders. Online orders reserve their products;
/// in-store orders sell them outright and require a staff member.
pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let mut order = payload.validate()?;

    let customer_id = match order.channel {
        SalesChannel::Online => {
            let buyer = Users::find_by_id(user.user_id)
                .one(&state.orm)
                .await?
                .ok_or(AppError::Unauthorized)?;
            if order.customer.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
                order.customer.name = Some(buyer.name);
            }
            if order.customer.email.is_none() {
                order.customer.email = Some(buyer.email);
            }
            Some(user.user_id)
        }
        SalesChannel::InStore => {
            ensure_staff(user)?;
            customer_id_for_email(state, order.customer.email.as_deref()).await?
        }
    };

    let created = place_order(state, user, order, customer_id).await?;
    Ok(ApiResponse::success("Order created", created, Some(Meta::empty())))
}

pub(crate) async fn customer_id_for_email(
    state: &AppState,
    email: Option<&str>,
) -> AppResult<Option<Uuid>> {
    let Some(email) = email.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty()) else {
        return Ok(None);
    };
    let user = Users::find()
        .filter(crate::entity::users::Column::Email.eq(email))
        .one(&state.orm)
        .await?;
    Ok(user.map(|u| u.id))
}

/// Claim every product, then write the order and its frozen line items, all in
/// one transaction.
pub(crate) async fn place_order(
    state: &AppState,
    user: &AuthUser,
    order: ValidatedOrder,
    customer_id: Option<Uuid>,
) -> AppResult<OrderWithItems> {
    let ValidatedOrder {
        channel,
        customer,
        items,
        totals,
        payment_method,
    } = order;

    let customer_name = customer
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::validation("customer name is required"))?;

    let order_id = Uuid::new_v4();
    let product_ids: Vec<Uuid> = items.iter().map(|item| item.product_id).collect();

    let txn = state.orm.begin().await?;

    transition_products(&txn, &product_ids, channel.claim(), true).await?;

    let order = OrderActive {
        id: Set(order_id),
        order_number: Set(build_order_number(order_id, Utc::now().date_naive())),
        customer_id: Set(customer_id),
        customer_name: Set(customer_name),
        customer_email: Set(customer.email),
        customer_address: Set(customer.address),
        subtotal: Set(totals.subtotal),
        shipping_cost: Set(totals.shipping_cost),
        total: Set(totals.total),
        channel: Set(channel),
        status: Set(channel.initial_status()),
        payment_method: Set(payment_method),
        tracking_number: Set(None),
        created_by: Set(Some(user.user_id)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await
    .map_err(|err| unique_violation(err, "Order number already exists"))?;

    let mut order_items = Vec::with_capacity(items.len());
    for item in items {
        let saved = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(Some(item.product_id)),
            name: Set(item.name),
            unit_price: Set(item.unit_price),
            quantity: Set(item.quantity),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        order_items.push(OrderItem::from(saved));
    }

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        order_number = %order.order_number,
        channel = %order.channel,
        total = order.total,
        "order placed"
    );
    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_create",
        "orders",
        serde_json::json!({
            "order_id": order.id,
            "channel": order.channel,
            "products": product_ids,
        }),
    )
    .await;

    Ok(OrderWithItems {
        order: Order::from(order),
        items: order_items,
    })
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_can_view(user, &order)?;

    let data = with_items(&state.orm, order).await?;
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

/// Order history for one customer; visible to that customer and to staff.
pub async fn list_customer_orders(
    state: &AppState,
    user: &AuthUser,
    customer_id: Uuid,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    if user.user_id != customer_id && !user.role.is_staff() {
        return Err(AppError::Forbidden);
    }
    let condition = Condition::all().add(OrderCol::CustomerId.eq(customer_id));
    let (list, meta) = list_orders_where(&state.orm, condition, &query).await?;
    Ok(ApiResponse::success("Ok", list, Some(meta)))
}

/// Staff status change. `returned` is only reachable by approving a return.
pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_staff(user)?;
    if payload.status == OrderStatus::Returned {
        let current = Orders::find_by_id(id)
            .one(&state.orm)
            .await?
            .ok_or(AppError::NotFound)?;
        return Err(AppError::invalid_transition(current.status, OrderStatus::Returned));
    }

    let tracking_number = payload
        .tracking_number
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    let order = transition_order(state, user, id, payload.status, tracking_number).await?;

    Ok(ApiResponse::success("Order updated", order, Some(Meta::empty())))
}

/// Buyer-initiated cancellation of their own order.
pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_can_view(user, &order)?;

    let order = transition_order(state, user, id, OrderStatus::Cancelled, None).await?;
    Ok(ApiResponse::success("Order cancelled", order, Some(Meta::empty())))
}

/// Move an order to `next` and apply the coupled availability change to its
/// products in the same transaction.
pub(crate) async fn transition_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    next: OrderStatus,
    tracking_number: Option<String>,
) -> AppResult<Order> {
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let previous = order.status;

    if let Some(effect) = previous.plan_transition(next)? {
        let product_ids = order_product_ids(&txn, order.id).await?;
        transition_products(&txn, &product_ids, effect, false).await?;
    }

    let mut active: OrderActive = order.into();
    active.status = Set(next);
    if tracking_number.is_some() {
        active.tracking_number = Set(tracking_number);
    }
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(order_id = %order.id, from = %previous, to = %next, "order status changed");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "from": previous, "to": next }),
    )
    .await;

    Ok(Order::from(order))
}

pub(crate) async fn order_product_ids<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
) -> AppResult<Vec<Uuid>> {
    let ids = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(conn)
        .await?
        .into_iter()
        .filter_map(|item| item.product_id)
        .collect();
    Ok(ids)
}

pub(crate) async fn with_items<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
) -> AppResult<OrderWithItems> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    Ok(OrderWithItems {
        order: Order::from(order),
        items,
    })
}

pub(crate) async fn list_orders_where<C: ConnectionTrait>(
    conn: &C,
    mut condition: Condition,
    query: &OrderListQuery,
) -> AppResult<(OrderList, Meta)> {
    let (page, limit, offset) = query.pagination().normalize();
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }
    if let Some(channel) = query.channel {
        condition = condition.add(OrderCol::Channel.eq(channel));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(conn).await?;

    let items = finder
        .limit(limit)
        .offset(offset)
        .all(conn)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    Ok((OrderList { items, total }, Meta::new(page, limit, total)))
}

fn ensure_can_view(user: &AuthUser, order: &OrderModel) -> AppResult<()> {
    if order.customer_id == Some(user.user_id) || user.role.is_staff() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
