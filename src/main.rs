use std::{net::SocketAddr, sync::Arc};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_api::{
    app::build_app,
    cache::CatalogCache,
    cart::{CartStore, InMemoryCartStore, RedisCartStore},
    config::AppConfig,
    db::{create_pool, run_migrations},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,storefront_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let cart: Arc<dyn CartStore> = match config.redis_url.as_deref() {
        Some(url) => Arc::new(RedisCartStore::connect(url).await?),
        None => {
            tracing::warn!("REDIS_URL not set, carts are kept in process memory");
            Arc::new(InMemoryCartStore::new())
        }
    };
    let catalog = CatalogCache::new(config.catalog_cache_ttl);

    tracing::info!(
        lock_timeout_ms = config.checkout.lock_timeout.as_millis() as u64,
        shipping_fee = %config.checkout.shipping_fee,
        "checkout configured"
    );
    let state = AppState::new(pool, cart, catalog, config.checkout.clone());
    let app = build_app(state);

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    tracing::info!("listening on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
