use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    dto::{
        orders::{CustomerSnapshot, OrderWithItems},
        pos::{PosProductQuery, PosSaleRequest},
        products::ProductList,
    },
    entity::products::{Column as ProdCol, Entity as Products},
    error::{AppError, AppResult},
    lifecycle::ProductStatus,
    middleware::auth::{AuthUser, ensure_staff},
    models::Product,
    pos::PosSession,
    response::{ApiResponse, Meta},
    routes::params::ProductQuery,
    services::{order_service, product_service},
    state::AppState,
};

/// Catalog as seen from the till: available products only.
pub async fn list_sellable(
    state: &AppState,
    user: &AuthUser,
    query: PosProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_staff(user)?;
    product_service::list_products(
        state,
        ProductQuery {
            search: query.search,
            category: None,
            status: Some(ProductStatus::Available),
            page: query.page,
            limit: query.limit,
        },
    )
    .await
}

pub async fn scan_barcode(
    state: &AppState,
    user: &AuthUser,
    code: &str,
) -> AppResult<ApiResponse<Product>> {
    ensure_staff(user)?;
    let product = product_service::find_by_barcode(state, code).await?;
    if product.status != ProductStatus::Available {
        return Err(AppError::conflict(format!(
            "product {} is {}",
            product.id, product.status
        )));
    }
    Ok(ApiResponse::success("Product", product, Some(Meta::empty())))
}

/// Load the submitted products into a fresh ticket, in submission order.
pub async fn open_session(state: &AppState, product_ids: &[Uuid]) -> AppResult<PosSession> {
    let products = Products::find()
        .filter(ProdCol::Id.is_in(product_ids.iter().copied()))
        .all(&state.orm)
        .await?;

    let mut session = PosSession::new();
    for id in product_ids {
        let product = products
            .iter()
            .find(|p| p.id == *id)
            .cloned()
            .map(Product::from)
            .ok_or(AppError::NotFound)?;
        session.add(&product)?;
    }
    Ok(session)
}

/// Finalize the ticket: one in-store order, every product sold, ticket cleared.
/// Availability is re-checked against the store at this point, so a product
/// sold by another till since it was scanned yields `Conflict` and the ticket
/// is left untouched.
pub async fn finalize(
    state: &AppState,
    user: &AuthUser,
    session: &mut PosSession,
    customer: Option<CustomerSnapshot>,
    payment_method: &str,
) -> AppResult<OrderWithItems> {
    ensure_staff(user)?;
    let order = session.to_order(customer, payment_method)?;
    let customer_id =
        order_service::customer_id_for_email(state, order.customer.email.as_deref()).await?;

    let sale = order_service::place_order(state, user, order, customer_id).await?;
    session.clear();
    Ok(sale)
}

pub async fn record_sale(
    state: &AppState,
    user: &AuthUser,
    payload: PosSaleRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_staff(user)?;
    let mut session = open_session(state, &payload.items).await?;
    let sale = finalize(
        state,
        user,
        &mut session,
        payload.customer,
        &payload.payment_method,
    )
    .await?;
    Ok(ApiResponse::success("Sale recorded", sale, Some(Meta::empty())))
}
