use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CartEntry, CartError, CartStore};

/// Process-local cart store, used when no Redis is configured and in tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCartStore {
    carts: Arc<RwLock<HashMap<Uuid, BTreeMap<Uuid, i32>>>>,
    fail_deletes: Arc<AtomicBool>,
    fail_reads_for: Arc<std::sync::RwLock<Option<Uuid>>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `delete_many` fail, simulating an outage after an order commits.
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Makes `get_quantity` fail for one SKU, simulating an outage in the middle of a checkout.
    pub fn set_fail_quantity_reads(&self, sku_id: Option<Uuid>) {
        if let Ok(mut target) = self.fail_reads_for.write() {
            *target = sku_id;
        }
    }

    fn read_fails_for(&self, sku_id: Uuid) -> bool {
        self.fail_reads_for
            .read()
            .map(|target| *target == Some(sku_id))
            .unwrap_or(false)
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn get_quantity(&self, user_id: Uuid, sku_id: Uuid) -> Result<Option<i32>, CartError> {
        if self.read_fails_for(sku_id) {
            return Err(CartError::Unavailable("read rejected".into()));
        }
        let carts = self.carts.read().await;
        Ok(carts.get(&user_id).and_then(|c| c.get(&sku_id)).copied())
    }

    async fn set_quantity(
        &self,
        user_id: Uuid,
        sku_id: Uuid,
        quantity: i32,
    ) -> Result<(), CartError> {
        let mut carts = self.carts.write().await;
        carts.entry(user_id).or_default().insert(sku_id, quantity);
        Ok(())
    }

    async fn add_quantity(&self, user_id: Uuid, sku_id: Uuid, delta: i32) -> Result<i32, CartError> {
        let mut carts = self.carts.write().await;
        let quantity = carts.entry(user_id).or_default().entry(sku_id).or_insert(0);
        *quantity = quantity
            .checked_add(delta)
            .ok_or(CartError::QuantityOverflow { sku_id })?;
        Ok(*quantity)
    }

    async fn remove(&self, user_id: Uuid, sku_id: Uuid) -> Result<bool, CartError> {
        let mut carts = self.carts.write().await;
        Ok(carts
            .get_mut(&user_id)
            .is_some_and(|c| c.remove(&sku_id).is_some()))
    }

    async fn delete_many(&self, user_id: Uuid, sku_ids: &[Uuid]) -> Result<u64, CartError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(CartError::Unavailable("delete rejected".into()));
        }
        let mut carts = self.carts.write().await;
        let Some(cart) = carts.get_mut(&user_id) else {
            return Ok(0);
        };
        let removed = sku_ids
            .iter()
            .filter(|sku_id| cart.remove(sku_id).is_some())
            .count();
        Ok(removed as u64)
    }

    async fn entries(&self, user_id: Uuid) -> Result<Vec<CartEntry>, CartError> {
        let carts = self.carts.read().await;
        Ok(carts
            .get(&user_id)
            .map(|c| {
                c.iter()
                    .map(|(&sku_id, &quantity)| CartEntry { sku_id, quantity })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn len(&self, user_id: Uuid) -> Result<usize, CartError> {
        let carts = self.carts.read().await;
        Ok(carts.get(&user_id).map_or(0, BTreeMap::len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::total_quantity;

    #[tokio::test]
    async fn bulk_delete_keeps_unselected_entries() {
        let store = InMemoryCartStore::new();
        let user = Uuid::new_v4();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        store.set_quantity(user, a, 2).await.unwrap();
        store.set_quantity(user, b, 1).await.unwrap();
        store.set_quantity(user, c, 5).await.unwrap();

        let removed = store.delete_many(user, &[a, b]).await.unwrap();

        assert_eq!(removed, 2);
        assert_eq!(store.get_quantity(user, a).await.unwrap(), None);
        assert_eq!(store.get_quantity(user, b).await.unwrap(), None);
        assert_eq!(store.get_quantity(user, c).await.unwrap(), Some(5));
    }

    #[tokio::test]
    async fn carts_are_isolated_per_user() {
        let store = InMemoryCartStore::new();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let sku = Uuid::new_v4();
        store.set_quantity(alice, sku, 3).await.unwrap();

        assert_eq!(store.get_quantity(bob, sku).await.unwrap(), None);
        assert_eq!(store.delete_many(bob, &[sku]).await.unwrap(), 0);
        assert_eq!(store.get_quantity(alice, sku).await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn entries_and_len_reflect_cart() {
        let store = InMemoryCartStore::new();
        let user = Uuid::new_v4();
        store.set_quantity(user, Uuid::new_v4(), 2).await.unwrap();
        store.set_quantity(user, Uuid::new_v4(), 4).await.unwrap();

        let entries = store.entries(user).await.unwrap();
        assert_eq!(store.len(user).await.unwrap(), 2);
        assert_eq!(total_quantity(&entries), 6);
        assert!(entries.windows(2).all(|w| w[0].sku_id < w[1].sku_id));
    }

    #[tokio::test]
    async fn add_quantity_accumulates() {
        let store = InMemoryCartStore::new();
        let user = Uuid::new_v4();
        let sku = Uuid::new_v4();
        assert_eq!(store.add_quantity(user, sku, 2).await.unwrap(), 2);
        assert_eq!(store.add_quantity(user, sku, 3).await.unwrap(), 5);
        assert_eq!(store.get_quantity(user, sku).await.unwrap(), Some(5));
    }

    #[tokio::test]
    async fn add_quantity_past_i32_max_keeps_previous_value() {
        let store = InMemoryCartStore::new();
        let user = Uuid::new_v4();
        let sku = Uuid::new_v4();
        store.add_quantity(user, sku, 1).await.unwrap();

        let err = store.add_quantity(user, sku, i32::MAX).await.unwrap_err();

        assert!(matches!(err, CartError::QuantityOverflow { sku_id } if sku_id == sku));
        assert_eq!(store.get_quantity(user, sku).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn failing_reads_only_hit_the_chosen_sku() {
        let store = InMemoryCartStore::new();
        let user = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        store.set_quantity(user, a, 1).await.unwrap();
        store.set_quantity(user, b, 2).await.unwrap();
        store.set_fail_quantity_reads(Some(b));

        assert_eq!(store.get_quantity(user, a).await.unwrap(), Some(1));
        assert!(store.get_quantity(user, b).await.is_err());

        store.set_fail_quantity_reads(None);
        assert_eq!(store.get_quantity(user, b).await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn remove_reports_missing_entries() {
        let store = InMemoryCartStore::new();
        let user = Uuid::new_v4();
        let sku = Uuid::new_v4();
        assert!(!store.remove(user, sku).await.unwrap());
        store.set_quantity(user, sku, 1).await.unwrap();
        assert!(store.remove(user, sku).await.unwrap());
    }

    #[tokio::test]
    async fn failing_deletes_leave_cart_untouched() {
        let store = InMemoryCartStore::new();
        let user = Uuid::new_v4();
        let sku = Uuid::new_v4();
        store.set_quantity(user, sku, 1).await.unwrap();
        store.set_fail_deletes(true);

        assert!(store.delete_many(user, &[sku]).await.is_err());
        assert_eq!(store.get_quantity(user, sku).await.unwrap(), Some(1));
    }
}
