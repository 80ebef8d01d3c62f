use axum::Router;

use crate::state::AppState;

pub mod account;
pub mod admin;
pub mod auth;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod pos;
pub mod products;
pub mod returns;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/products", products::router())
        .nest("/pos", pos::router())
        .nest("/admin", admin::router())
        .merge(auth::router())
        .merge(account::router())
        .merge(orders::router())
        .merge(returns::router())
}
