use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fulfillment state of an order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "PROCESSING")]
    Processing,
    #[sea_orm(string_value = "SHIPPED")]
    Shipped,
    #[sea_orm(string_value = "DELIVERED")]
    Delivered,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

stored_codes!(OrderStatus {
    Pending => ("PENDING", "Pending"),
    Processing => ("PROCESSING", "Processing"),
    Shipped => ("SHIPPED", "Shipped"),
    Delivered => ("DELIVERED", "Delivered"),
    Cancelled => ("CANCELLED", "Cancelled"),
});

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "PAID")]
    Paid,
    #[default]
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "REFUNDED")]
    Refunded,
    #[sea_orm(string_value = "FAILED")]
    Failed,
}

stored_codes!(PaymentStatus {
    Paid => ("PAID", "Paid"),
    Pending => ("PENDING", "Pending"),
    Refunded => ("REFUNDED", "Refunded"),
    Failed => ("FAILED", "Failed"),
});

/// The `orders` table. `total_amount` is derived from the order's items and
/// only ever written by the order total recomputation.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// `None` for guest orders
    pub customer_id: Option<i32>,
    pub order_date: DateTime<Utc>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub total_amount: Decimal,
    pub shipping_address_id: Option<i32>,
    pub billing_address_id: Option<i32>,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_method: Option<String>,
    pub tracking_number: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id",
        on_delete = "Cascade"
    )]
    Customer,
    #[sea_orm(
        belongs_to = "super::address::Entity",
        from = "Column::ShippingAddressId",
        to = "super::address::Column::Id",
        on_delete = "Cascade"
    )]
    ShippingAddress,
    #[sea_orm(
        belongs_to = "super::address::Entity",
        from = "Column::BillingAddressId",
        to = "super::address::Column::Id",
        on_delete = "Cascade"
    )]
    BillingAddress,
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
    #[sea_orm(has_many = "super::applied_promotion::Entity")]
    AppliedPromotions,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::applied_promotion::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AppliedPromotions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
