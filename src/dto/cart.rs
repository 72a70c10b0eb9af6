use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::CartLineView;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub sku_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub total_count: i64,
    #[schema(value_type = String)]
    pub total_price: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartCount {
    /// Distinct SKUs in the cart.
    pub entries: usize,
    /// Sum of all quantities.
    pub total_quantity: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemUpdated {
    pub sku_id: Uuid,
    pub quantity: i32,
    #[serde(flatten)]
    pub cart: CartCount,
}
