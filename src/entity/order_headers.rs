use std::{fmt, str::FromStr};

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "order_headers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub order_id: String,
    pub user_id: Uuid,
    pub address_id: Uuid,
    pub payment_method: PaymentMethod,
    pub total_count: i32,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub shipping_fee: Decimal,
    pub status: OrderStatus,
    pub trade_no: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "cash_on_delivery")]
    CashOnDelivery,
    #[sea_orm(string_value = "wechat_pay")]
    WechatPay,
    #[sea_orm(string_value = "alipay")]
    Alipay,
    #[sea_orm(string_value = "union_pay")]
    UnionPay,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "cash_on_delivery",
            PaymentMethod::WechatPay => "wechat_pay",
            PaymentMethod::Alipay => "alipay",
            PaymentMethod::UnionPay => "union_pay",
        }
    }

    /// Whether the order is settled through an online gateway rather than on delivery.
    pub fn is_online(&self) -> bool {
        !matches!(self, PaymentMethod::CashOnDelivery)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "cash_on_delivery" => Ok(PaymentMethod::CashOnDelivery),
            "wechat_pay" => Ok(PaymentMethod::WechatPay),
            "alipay" => Ok(PaymentMethod::Alipay),
            "union_pay" => Ok(PaymentMethod::UnionPay),
            other => Err(format!("unsupported payment method: {other:?}")),
        }
    }
}

/// Lifecycle: unpaid -> awaiting_review (after payment) -> completed (after review).
/// Shipment states are set out of band by fulfilment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "unpaid")]
    Unpaid,
    #[sea_orm(string_value = "awaiting_shipment")]
    AwaitingShipment,
    #[sea_orm(string_value = "awaiting_receipt")]
    AwaitingReceipt,
    #[sea_orm(string_value = "awaiting_review")]
    AwaitingReview,
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Unpaid => "unpaid",
            OrderStatus::AwaitingShipment => "awaiting_shipment",
            OrderStatus::AwaitingReceipt => "awaiting_receipt",
            OrderStatus::AwaitingReview => "awaiting_review",
            OrderStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "unpaid" => Ok(OrderStatus::Unpaid),
            "awaiting_shipment" => Ok(OrderStatus::AwaitingShipment),
            "awaiting_receipt" => Ok(OrderStatus::AwaitingReceipt),
            "awaiting_review" => Ok(OrderStatus::AwaitingReview),
            "completed" => Ok(OrderStatus::Completed),
            other => Err(format!("unknown order status: {other:?}")),
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::addresses::Entity",
        from = "Column::AddressId",
        to = "super::addresses::Column::Id"
    )]
    Addresses,
    #[sea_orm(has_many = "super::order_lines::Entity")]
    OrderLines,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::addresses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Addresses.def()
    }
}

impl Related<super::order_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_method_parses_supported_values() {
        assert_eq!(
            "alipay".parse::<PaymentMethod>(),
            Ok(PaymentMethod::Alipay)
        );
        assert_eq!(
            " cash_on_delivery ".parse::<PaymentMethod>(),
            Ok(PaymentMethod::CashOnDelivery)
        );
        assert!("bitcoin".parse::<PaymentMethod>().is_err());
        assert!("".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn only_cash_on_delivery_is_offline() {
        assert!(!PaymentMethod::CashOnDelivery.is_online());
        assert!(PaymentMethod::Alipay.is_online());
    }
}
