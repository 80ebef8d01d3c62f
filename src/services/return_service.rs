use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, Iterable,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::returns::{CreateReturnRequest, ReturnList, UpdateReturnStatusRequest},
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Entity as Orders},
        return_items::{ActiveModel as ReturnItemActive, Column as ReturnItemCol, Entity as ReturnItems},
        return_tickets::{
            ActiveModel as TicketActive, Column as TicketCol, Entity as ReturnTickets,
            Model as TicketModel,
        },
        users::Entity as Users,
    },
    error::{AppError, AppResult, unique_violation},
    lifecycle::{OrderStatus, ProductTransition, ReturnStatus},
    middleware::auth::{AuthUser, ensure_catalog_manager, ensure_staff},
    models::ReturnTicket,
    response::{ApiResponse, Meta},
    routes::params::ReturnListQuery,
    services::product_service::transition_products,
    state::AppState,
};

const OPEN_TICKET_EXISTS: &str = "this order already has an open return request";

/// A buyer asks to return items from one of their delivered orders.
pub async fn request_return(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: CreateReturnRequest,
) -> AppResult<ApiResponse<ReturnTicket>> {
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    if order.customer_id != Some(user.user_id) {
        return Err(AppError::Forbidden);
    }
    if !order.status.can_transition_to(OrderStatus::Returned) {
        return Err(AppError::invalid_transition(order.status, OrderStatus::Returned));
    }

    let open = ReturnTickets::find()
        .filter(TicketCol::OrderId.eq(order.id))
        .filter(TicketCol::Status.is_in(ReturnStatus::iter().filter(|s| s.is_open())))
        .count(&txn)
        .await?;
    if open > 0 {
        return Err(AppError::conflict(OPEN_TICKET_EXISTS));
    }

    let ordered: Vec<(Uuid, i32)> = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&txn)
        .await?
        .into_iter()
        .filter_map(|item| item.product_id.map(|id| (id, item.quantity)))
        .collect();
    let (reason, items) = payload.validate(&ordered)?;

    let customer_email = match order.customer_email {
        Some(email) => email,
        None => {
            Users::find_by_id(user.user_id)
                .one(&txn)
                .await?
                .ok_or(AppError::Unauthorized)?
                .email
        }
    };

    let ticket = TicketActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        requested_by: Set(user.user_id),
        customer_email: Set(customer_email),
        reason: Set(reason),
        status: Set(ReturnStatus::Requested),
        decided_by: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await
    .map_err(|err| unique_violation(err, OPEN_TICKET_EXISTS))?;

    let mut saved = Vec::with_capacity(items.len());
    for item in items {
        let row = ReturnItemActive {
            id: Set(Uuid::new_v4()),
            return_id: Set(ticket.id),
            product_id: Set(item.product_id),
            quantity: Set(item.quantity),
        }
        .insert(&txn)
        .await?;
        saved.push(row);
    }

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "return_request",
        "return_tickets",
        serde_json::json!({ "return_id": ticket.id, "order_id": order_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Return requested",
        ReturnTicket::from_parts(ticket, saved),
        Some(Meta::empty()),
    ))
}

pub async fn list_returns(
    state: &AppState,
    user: &AuthUser,
    query: ReturnListQuery,
) -> AppResult<ApiResponse<ReturnList>> {
    ensure_staff(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status {
        condition = condition.add(TicketCol::Status.eq(status));
    }

    let finder = ReturnTickets::find()
        .filter(condition)
        .order_by_desc(TicketCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await?;

    let tickets = finder.limit(limit).offset(offset).all(&state.orm).await?;
    let mut items = Vec::with_capacity(tickets.len());
    for ticket in tickets {
        items.push(load_ticket(&state.orm, ticket).await?);
    }

    Ok(ApiResponse::success(
        "Returns",
        ReturnList { items, total },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Staff decision on a ticket. Approval moves the order to `returned` and puts
/// the returned products back on sale, atomically.
pub async fn update_return_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateReturnStatusRequest,
) -> AppResult<ApiResponse<ReturnTicket>> {
    ensure_catalog_manager(user)?;
    let next = payload.status;

    let txn = state.orm.begin().await?;
    let ticket = ReturnTickets::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    ticket.status.ensure_transition(next)?;

    let items = ReturnItems::find()
        .filter(ReturnItemCol::ReturnId.eq(ticket.id))
        .all(&txn)
        .await?;

    if next == ReturnStatus::Approved {
        let order = Orders::find_by_id(ticket.order_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        let effect = order
            .status
            .plan_transition(OrderStatus::Returned)?
            .unwrap_or(ProductTransition::RESTOCK);

        let product_ids: Vec<Uuid> = items.iter().map(|item| item.product_id).collect();
        transition_products(&txn, &product_ids, effect, false).await?;

        let mut active: OrderActive = order.into();
        active.status = Set(OrderStatus::Returned);
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?;

        tracing::info!(
            return_id = %ticket.id,
            order_id = %ticket.order_id,
            products = ?product_ids,
            "return approved, products restocked"
        );
    }

    let mut active: TicketActive = ticket.into();
    active.status = Set(next);
    active.decided_by = Set(Some(user.user_id));
    active.updated_at = Set(Utc::now().into());
    let ticket = active.update(&txn).await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "return_status_update",
        "return_tickets",
        serde_json::json!({
            "return_id": ticket.id,
            "order_id": ticket.order_id,
            "status": next,
            "products": items.iter().map(|item| item.product_id).collect::<Vec<_>>(),
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Return updated",
        ReturnTicket::from_parts(ticket, items),
        Some(Meta::empty()),
    ))
}

async fn load_ticket<C: ConnectionTrait>(conn: &C, ticket: TicketModel) -> AppResult<ReturnTicket> {
    let items = ReturnItems::find()
        .filter(ReturnItemCol::ReturnId.eq(ticket.id))
        .all(conn)
        .await?;
    Ok(ReturnTicket::from_parts(ticket, items))
}
