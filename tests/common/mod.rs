#![allow(dead_code)]

use history_keepers_api::{
    db::{create_pool, run_migrations},
    dto::products::CreateProductRequest,
    entity::users::{ActiveModel as UserActive, UserRole},
    middleware::auth::AuthUser,
    models::Product,
    services::product_service,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use std::time::Duration;
use uuid::Uuid;

/// Connects to the test database, or returns `None` so the caller can skip.
pub async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url, 5, Duration::from_secs(5)).await?;
    run_migrations(&pool).await?;
    Ok(Some(AppState::new(pool, "test-secret")))
}

/// Inserts a user with a unique email so tests can share one database.
pub async fn create_user(state: &AppState, role: UserRole) -> anyhow::Result<AuthUser> {
    let id = Uuid::new_v4();
    UserActive {
        id: Set(id),
        name: Set(format!("{} {}", role.as_str(), &id.simple().to_string()[..6])),
        email: Set(format!("{}-{}@example.com", role.as_str(), id.simple())),
        password_hash: Set("dummy".into()),
        role: Set(role),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser { user_id: id, role })
}

pub async fn create_product(
    state: &AppState,
    manager: &AuthUser,
    name: &str,
    price: i64,
    category: &str,
) -> anyhow::Result<Product> {
    let resp = product_service::create_product(
        state,
        manager,
        CreateProductRequest {
            name: Some(name.to_string()),
            description: None,
            price: Some(price),
            category: Some(category.to_string()),
            images: None,
            highlights: None,
            discount: None,
            barcode: None,
        },
    )
    .await?;
    resp.data
        .ok_or_else(|| anyhow::anyhow!("create_product returned no data"))
}

pub async fn product_status(
    state: &AppState,
    id: Uuid,
) -> anyhow::Result<history_keepers_api::lifecycle::ProductStatus> {
    let resp = product_service::get_product(state, id).await?;
    let product = resp
        .data
        .ok_or_else(|| anyhow::anyhow!("get_product returned no data"))?;
    Ok(product.status)
}
