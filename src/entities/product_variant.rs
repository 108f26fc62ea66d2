use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sizes offered on the variant form.
pub const SIZE_OPTIONS: [&str; 5] = ["S", "M", "L", "XL", "XXL"];

/// Colors offered on the variant form.
pub const COLOR_OPTIONS: [&str; 6] = ["Red", "Blue", "Green", "Black", "White", "Gray"];

/// A color/size combination of a product, the unit stock is kept in.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_variants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub product_id: i32,
    pub color: String,
    pub size: String,
    #[sea_orm(unique)]
    pub sku: String,
    pub quantity_in_stock: i32,
}

impl Model {
    pub fn is_low_stock(&self, threshold: i32) -> bool {
        self.quantity_in_stock <= threshold
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_delete = "Cascade"
    )]
    Product,
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
