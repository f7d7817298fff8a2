//! Product entity model
//!
//! Covers both stocked goods and services. Services never track stock, so
//! their `quantity` and `min_stock` stay at zero.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub workspace_id: Uuid,

    pub name: String,

    pub description: Option<String>,

    /// Stock keeping unit, unique per workspace when set
    pub sku: Option<String>,

    /// Sale price
    pub price: f64,

    /// Acquisition cost, if tracked
    pub cost_price: Option<f64>,

    /// Units on hand
    pub quantity: i32,

    /// Threshold at or below which the product counts as low stock
    pub min_stock: i32,

    pub is_service: bool,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// True for goods whose stock has reached the minimum.
    pub fn is_low_stock(&self) -> bool {
        !self.is_service && self.quantity <= self.min_stock
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
