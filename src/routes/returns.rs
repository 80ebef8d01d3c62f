use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::returns::{ReturnList, UpdateReturnStatusRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::ReturnTicket,
    response::ApiResponse,
    routes::params::ReturnListQuery,
    services::return_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/returns", get(list_returns))
        .route("/returns/{id}/status", put(update_return_status))
}

#[utoipa::path(
    get,
    path = "/api/returns",
    params(ReturnListQuery),
    responses(
        (status = 200, description = "Return tickets", body = ApiResponse<ReturnList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Returns"
)]
pub async fn list_returns(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ReturnListQuery>,
) -> AppResult<Json<ApiResponse<ReturnList>>> {
    let resp = return_service::list_returns(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/returns/{id}/status",
    params(("id" = Uuid, Path, description = "Return ticket ID")),
    request_body = UpdateReturnStatusRequest,
    responses(
        (status = 200, description = "Return updated", body = ApiResponse<ReturnTicket>),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Transition not allowed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Returns"
)]
pub async fn update_return_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReturnStatusRequest>,
) -> AppResult<Json<ApiResponse<ReturnTicket>>> {
    let resp = return_service::update_return_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
