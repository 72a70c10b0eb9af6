use std::{env, time::Duration};

use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub checkout: CheckoutSettings,
    pub catalog_cache_ttl: Duration,
}

/// Knobs for the order-commit transaction.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    /// Upper bound on how long a checkout waits for a SKU row lock.
    pub lock_timeout: Duration,
    /// Flat shipping fee charged per order.
    pub shipping_fee: Decimal,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_millis(5000),
            shipping_fee: Decimal::new(10, 0),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let redis_url = env::var("REDIS_URL").ok().filter(|url| !url.is_empty());
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        let defaults = CheckoutSettings::default();
        let lock_timeout = env::var("CHECKOUT_LOCK_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.lock_timeout);
        let shipping_fee = match env::var("SHIPPING_FEE") {
            Ok(raw) => raw
                .parse::<Decimal>()
                .map_err(|e| anyhow::anyhow!("invalid SHIPPING_FEE {raw:?}: {e}"))?,
            Err(_) => defaults.shipping_fee,
        };
        let catalog_cache_ttl = env::var("CATALOG_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(3600));

        Ok(Self {
            port,
            database_url,
            redis_url,
            host,
            checkout: CheckoutSettings {
                lock_timeout,
                shipping_fee,
            },
            catalog_cache_ttl,
        })
    }
}
