use std::sync::Arc;

use crate::{
    cache::CatalogCache,
    cart::CartStore,
    config::CheckoutSettings,
    db::{DbPool, OrmConn, orm_from_pool},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub cart: Arc<dyn CartStore>,
    pub catalog: CatalogCache,
    pub checkout: CheckoutSettings,
}

impl AppState {
    pub fn new(
        pool: DbPool,
        cart: Arc<dyn CartStore>,
        catalog: CatalogCache,
        checkout: CheckoutSettings,
    ) -> Self {
        let orm = orm_from_pool(&pool);
        Self {
            pool,
            orm,
            cart,
            catalog,
            checkout,
        }
    }
}
