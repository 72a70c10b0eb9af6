use rust_decimal::Decimal;
use storefront_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    middleware::auth::issue_token,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin").await?;
    let user_id = ensure_user(&pool, "user@example.com", "user").await?;
    seed_catalog(&pool).await?;
    ensure_address(&pool, user_id).await?;

    let ttl = chrono::Duration::days(7);
    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    println!("ADMIN_TOKEN={}", issue_token(admin_id, "admin", ttl)?);
    println!("USER_TOKEN={}", issue_token(user_id, "user", ttl)?);
    Ok(())
}

async fn ensure_user(pool: &sqlx::PgPool, email: &str, role: &str) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, role)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(id)
}

async fn seed_catalog(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let catalog = [
        ("Fresh Fruit", "Seasonal fruit", "Apple 500g", Decimal::new(200, 2), 10),
        ("Fresh Fruit", "Seasonal fruit", "Banana 1kg", Decimal::new(550, 2), 40),
        ("Pantry", "Dry goods", "Green Tea 250g", Decimal::new(1290, 2), 25),
        ("Pantry", "Dry goods", "Jasmine Rice 5kg", Decimal::new(3900, 2), 3),
    ];

    for (product, description, sku, price, stock) in catalog {
        let (product_id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO products (id, name, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE SET description = EXCLUDED.description
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(product)
        .bind(description)
        .fetch_one(pool)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO skus (id, product_id, name, price, stock)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(product_id)
        .bind(sku)
        .bind(price)
        .bind(stock)
        .execute(pool)
        .await?;
    }

    println!("Seeded catalog");
    Ok(())
}

async fn ensure_address(pool: &sqlx::PgPool, user_id: Uuid) -> anyhow::Result<()> {
    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM addresses WHERE user_id = $1 AND is_default")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    if let Some((id,)) = existing {
        println!("Default address {id} already present");
        return Ok(());
    }

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO addresses (id, user_id, receiver, detail, zip_code, phone, is_default)
        VALUES ($1, $2, 'Demo Shopper', '1 Market Street', '100000', '13800000000', TRUE)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    println!("Seeded default address {id}");
    Ok(())
}
