use history_keepers_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    entity::users::UserRole,
    services::auth_service::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(
        &config.database_url,
        config.db_max_connections,
        config.db_acquire_timeout,
    )
    .await?;
    run_migrations(&pool).await?;

    let admin_id = ensure_user(&pool, "Admin", "admin@example.com", "admin123", UserRole::Admin).await?;
    ensure_user(&pool, "Store Manager", "manager@example.com", "manager123", UserRole::Manager).await?;
    ensure_user(&pool, "Till Worker", "worker@example.com", "worker123", UserRole::Worker).await?;
    let buyer_id = ensure_user(&pool, "Collector", "buyer@example.com", "buyer123", UserRole::Buyer).await?;
    seed_products(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, Buyer ID: {buyer_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    name: &str,
    email: &str,
    password: &str,
    role: UserRole,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role.as_str())
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={})", role.as_str());
    Ok(user_id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = [
        (
            "1986 World Cup final cap",
            "Caps",
            450_000_i64,
            10_i16,
            "HK-CAP-1986",
            serde_json::json!(["Match worn", "Signed on the visor"]),
        ),
        (
            "Home jersey, 1994 season",
            "Jerseys",
            1_200_000,
            0,
            "HK-JRS-1994",
            serde_json::json!(["Original tags", "Size L"]),
        ),
        (
            "Away jersey, 2002 cup run",
            "Jerseys",
            950_000,
            15,
            "HK-JRS-2002",
            serde_json::json!(["Player issue"]),
        ),
        (
            "Commemorative match ball",
            "Balls",
            320_000,
            0,
            "HK-BAL-1978",
            serde_json::json!(["Display case included"]),
        ),
    ];

    for (name, category, price, discount, barcode, highlights) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, price, category, highlights, discount, barcode)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (barcode) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(price)
        .bind(category)
        .bind(highlights)
        .bind(discount)
        .bind(barcode)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
