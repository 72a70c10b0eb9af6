use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

mod memory;
mod redis_store;

pub use memory::InMemoryCartStore;
pub use redis_store::RedisCartStore;

#[derive(Debug, Error)]
pub enum CartError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("cart store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt cart entry {field:?} for user {user_id}")]
    CorruptEntry { user_id: Uuid, field: String },

    #[error("cart quantity for sku {sku_id} out of range")]
    QuantityOverflow { sku_id: Uuid },
}

/// Per-user cart kept outside the relational database, one sku id to quantity map per user.
///
/// Writes here never join a database transaction. Checkout reads quantities while
/// holding SKU row locks and deletes the committed entries only after the order is durable.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Quantity the user selected for a SKU, `None` when the SKU is not in the cart.
    async fn get_quantity(&self, user_id: Uuid, sku_id: Uuid) -> Result<Option<i32>, CartError>;

    async fn set_quantity(&self, user_id: Uuid, sku_id: Uuid, quantity: i32)
    -> Result<(), CartError>;

    /// Add `delta` to the stored quantity (missing entries start at 0); returns the new quantity.
    async fn add_quantity(&self, user_id: Uuid, sku_id: Uuid, delta: i32)
    -> Result<i32, CartError>;

    /// Returns whether an entry was removed.
    async fn remove(&self, user_id: Uuid, sku_id: Uuid) -> Result<bool, CartError>;

    /// Bulk delete; returns how many entries existed.
    async fn delete_many(&self, user_id: Uuid, sku_ids: &[Uuid]) -> Result<u64, CartError>;

    /// All entries ordered by sku id.
    async fn entries(&self, user_id: Uuid) -> Result<Vec<CartEntry>, CartError>;

    /// Number of distinct SKUs in the cart.
    async fn len(&self, user_id: Uuid) -> Result<usize, CartError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartEntry {
    pub sku_id: Uuid,
    pub quantity: i32,
}

pub fn cart_key(user_id: Uuid) -> String {
    format!("cart_{user_id}")
}

/// Sum of quantities across the cart.
pub fn total_quantity(entries: &[CartEntry]) -> i64 {
    entries.iter().map(|e| i64::from(e.quantity)).sum()
}
