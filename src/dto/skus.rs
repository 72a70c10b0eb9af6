use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Sku;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SkuList {
    pub items: Vec<Sku>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RestockRequest {
    pub delta: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PriceUpdateRequest {
    #[schema(value_type = String, example = "9.90")]
    pub price: Decimal,
}
