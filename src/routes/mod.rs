use axum::Router;

use crate::state::AppState;

pub mod addresses;
pub mod admin;
pub mod cart;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod skus;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/skus", skus::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/addresses", addresses::router())
        .nest("/admin", admin::router())
}
