use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Address, CartLineView, OrderHeader, OrderLineView};

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub sku_ids: Vec<Uuid>,
}

/// Checkout page data: what the shopper is about to buy and where it can ship.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlaceOrderPreview {
    pub items: Vec<CartLineView>,
    pub total_count: i32,
    #[schema(value_type = String)]
    pub total_price: Decimal,
    #[schema(value_type = String)]
    pub shipping_fee: Decimal,
    #[schema(value_type = String)]
    pub total_payable: Decimal,
    pub addresses: Vec<Address>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CommitOrderRequest {
    pub address_id: Uuid,
    pub payment_method: String,
    pub sku_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CommitOrderResult {
    pub code: String,
    pub order_id: String,
    pub total_count: i32,
    #[schema(value_type = String)]
    pub total_price: Decimal,
    #[schema(value_type = String)]
    pub shipping_fee: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentConfirmationRequest {
    /// Transaction reference issued by the payment gateway.
    pub trade_no: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewEntry {
    pub sku_id: Uuid,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewRequest {
    /// Number of entries submitted; must match `entries`.
    pub total_count: usize,
    pub entries: Vec<ReviewEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithLines {
    pub order: OrderHeader,
    pub lines: Vec<OrderLineView>,
    #[schema(value_type = String)]
    pub total_payable: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<OrderHeader>,
}
