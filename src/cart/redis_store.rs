use std::collections::HashMap;

use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{CartEntry, CartError, CartStore, cart_key};

/// Cart store backed by one Redis hash per user (`cart_{user_id}` → {sku_id: quantity}).
#[derive(Clone)]
pub struct RedisCartStore {
    conn: MultiplexedConnection,
}

impl RedisCartStore {
    pub async fn connect(redis_url: &str) -> Result<Self, CartError> {
        let client = redis::Client::open(redis_url)?;
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        debug!("redis cart store connected");
        Ok(Self { conn })
    }
}

#[async_trait]
impl CartStore for RedisCartStore {
    #[instrument(skip(self))]
    async fn get_quantity(&self, user_id: Uuid, sku_id: Uuid) -> Result<Option<i32>, CartError> {
        let mut conn = self.conn.clone();
        let quantity: Option<i32> = conn.hget(cart_key(user_id), sku_id.to_string()).await?;
        Ok(quantity)
    }

    #[instrument(skip(self))]
    async fn set_quantity(
        &self,
        user_id: Uuid,
        sku_id: Uuid,
        quantity: i32,
    ) -> Result<(), CartError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .hset(cart_key(user_id), sku_id.to_string(), quantity)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn add_quantity(&self, user_id: Uuid, sku_id: Uuid, delta: i32) -> Result<i32, CartError> {
        let mut conn = self.conn.clone();
        let quantity: i32 = conn
            .hincr(cart_key(user_id), sku_id.to_string(), delta)
            .await?;
        Ok(quantity)
    }

    #[instrument(skip(self))]
    async fn remove(&self, user_id: Uuid, sku_id: Uuid) -> Result<bool, CartError> {
        let mut conn = self.conn.clone();
        let removed: u64 = conn.hdel(cart_key(user_id), sku_id.to_string()).await?;
        Ok(removed > 0)
    }

    #[instrument(skip(self, sku_ids), fields(count = sku_ids.len()))]
    async fn delete_many(&self, user_id: Uuid, sku_ids: &[Uuid]) -> Result<u64, CartError> {
        if sku_ids.is_empty() {
            return Ok(0);
        }
        let fields: Vec<String> = sku_ids.iter().map(Uuid::to_string).collect();
        let mut conn = self.conn.clone();
        let removed: u64 = conn.hdel(cart_key(user_id), fields).await?;
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn entries(&self, user_id: Uuid) -> Result<Vec<CartEntry>, CartError> {
        let mut conn = self.conn.clone();
        let raw: HashMap<String, i32> = conn.hgetall(cart_key(user_id)).await?;
        let mut entries = raw
            .into_iter()
            .map(|(field, quantity)| {
                let sku_id = Uuid::parse_str(&field)
                    .map_err(|_| CartError::CorruptEntry { user_id, field })?;
                Ok(CartEntry { sku_id, quantity })
            })
            .collect::<Result<Vec<_>, CartError>>()?;
        entries.sort_by_key(|e| e.sku_id);
        Ok(entries)
    }

    #[instrument(skip(self))]
    async fn len(&self, user_id: Uuid) -> Result<usize, CartError> {
        let mut conn = self.conn.clone();
        let len: usize = conn.hlen(cart_key(user_id)).await?;
        Ok(len)
    }
}
