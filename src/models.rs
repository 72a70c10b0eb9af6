use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    addresses, order_headers,
    order_headers::{OrderStatus, PaymentMethod},
    order_lines, skus,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Sku {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    #[schema(value_type = String, example = "2.00")]
    pub price: Decimal,
    pub stock: i32,
    pub sales: i32,
    pub created_at: DateTime<Utc>,
}

impl From<skus::Model> for Sku {
    fn from(model: skus::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            name: model.name,
            price: model.price,
            stock: model.stock,
            sales: model.sales,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub id: Uuid,
    pub receiver: String,
    pub detail: String,
    pub zip_code: Option<String>,
    pub phone: String,
    pub is_default: bool,
}

impl From<addresses::Model> for Address {
    fn from(model: addresses::Model) -> Self {
        Self {
            id: model.id,
            receiver: model.receiver,
            detail: model.detail,
            zip_code: model.zip_code,
            phone: model.phone,
            is_default: model.is_default,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderHeader {
    pub order_id: String,
    pub user_id: Uuid,
    pub address_id: Uuid,
    pub payment_method: PaymentMethod,
    pub total_count: i32,
    #[schema(value_type = String)]
    pub total_price: Decimal,
    #[schema(value_type = String)]
    pub shipping_fee: Decimal,
    pub status: OrderStatus,
    pub trade_no: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderHeader {
    pub fn total_payable(&self) -> Decimal {
        self.total_price + self.shipping_fee
    }
}

impl From<order_headers::Model> for OrderHeader {
    fn from(model: order_headers::Model) -> Self {
        Self {
            order_id: model.order_id,
            user_id: model.user_id,
            address_id: model.address_id,
            payment_method: model.payment_method,
            total_count: model.total_count,
            total_price: model.total_price,
            shipping_fee: model.shipping_fee,
            status: model.status,
            trade_no: model.trade_no,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderLine {
    pub id: Uuid,
    pub order_id: String,
    pub sku_id: Uuid,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<order_lines::Model> for OrderLine {
    fn from(model: order_lines::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            sku_id: model.sku_id,
            quantity: model.quantity,
            price: model.price,
            comment: model.comment,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// An order line together with its amount (`quantity * price`).
///
/// Derived figures live on the `*View` types and are computed when the view is
/// built; entities keep their stored shape.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderLineView {
    #[serde(flatten)]
    pub line: OrderLine,
    #[schema(value_type = String)]
    pub amount: Decimal,
}

impl From<OrderLine> for OrderLineView {
    fn from(line: OrderLine) -> Self {
        let amount = line_amount(line.price, line.quantity);
        Self { line, amount }
    }
}

/// A SKU as it sits in a cart: the selected quantity and resulting amount.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartLineView {
    pub sku: Sku,
    pub quantity: i32,
    #[schema(value_type = String)]
    pub amount: Decimal,
}

impl CartLineView {
    pub fn new(sku: Sku, quantity: i32) -> Self {
        let amount = line_amount(sku.price, quantity);
        Self {
            sku,
            quantity,
            amount,
        }
    }
}

pub fn line_amount(price: Decimal, quantity: i32) -> Decimal {
    price * Decimal::from(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sku(price: Decimal) -> Sku {
        Sku {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            name: "Apple 500g".into(),
            price,
            stock: 10,
            sales: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn cart_line_amount_is_price_times_quantity() {
        let line = CartLineView::new(sku(dec!(2.00)), 3);
        assert_eq!(line.amount, dec!(6.00));
    }

    #[test]
    fn order_line_view_uses_captured_price() {
        let line = OrderLine {
            id: Uuid::new_v4(),
            order_id: "o".into(),
            sku_id: Uuid::new_v4(),
            quantity: 4,
            price: dec!(1.25),
            comment: None,
            created_at: Utc::now(),
        };
        let view = OrderLineView::from(line);
        assert_eq!(view.amount, dec!(5.00));
    }
}
