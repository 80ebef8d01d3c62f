use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::{
        orders::OrderWithItems,
        pos::{PosProductQuery, PosSaleRequest},
        products::ProductList,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Product,
    response::ApiResponse,
    services::pos_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_sellable))
        .route("/barcode/{code}", get(scan_barcode))
        .route("/sales", post(record_sale))
}

#[utoipa::path(
    get,
    path = "/api/pos/products",
    params(
        ("search" = Option<String>, Query, description = "Name or category contains"),
        ("page" = Option<u64>, Query, description = "Page number, default 1"),
        ("limit" = Option<u64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "Available products", body = ApiResponse<ProductList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Point of sale"
)]
pub async fn list_sellable(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PosProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = pos_service::list_sellable(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/pos/barcode/{code}",
    params(("code" = String, Path, description = "Product barcode")),
    responses(
        (status = 200, description = "Scanned product", body = ApiResponse<Product>),
        (status = 404, description = "Unknown barcode"),
        (status = 409, description = "Product is not available"),
    ),
    security(("bearer_auth" = [])),
    tag = "Point of sale"
)]
pub async fn scan_barcode(
    State(state): State<AppState>,
    user: AuthUser,
    Path(code): Path<String>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = pos_service::scan_barcode(&state, &user, &code).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/pos/sales",
    request_body = PosSaleRequest,
    responses(
        (status = 201, description = "Sale recorded", body = ApiResponse<OrderWithItems>),
        (status = 409, description = "A product was sold elsewhere"),
        (status = 422, description = "Empty ticket or duplicate product"),
    ),
    security(("bearer_auth" = [])),
    tag = "Point of sale"
)]
pub async fn record_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<PosSaleRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderWithItems>>)> {
    let resp = pos_service::record_sale(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
