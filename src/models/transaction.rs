//! Financial transaction entity model
//!
//! Ledger entries: receivables (`INCOME`) and payables (`EXPENSE`), each
//! with a due date and an optional link to the order that originated it.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

use super::enums::{TransactionStatus, TransactionType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub workspace_id: Uuid,

    /// Originating order (set to null if the order is deleted)
    pub order_id: Option<Uuid>,

    pub description: String,

    /// Always positive; direction is carried by `kind`
    pub amount: f64,

    #[sea_orm(column_name = "type")]
    pub kind: TransactionType,

    pub status: TransactionStatus,

    pub category: Option<String>,

    pub due_date: DateTimeWithTimeZone,

    /// Stamped when the entry is recorded as paid
    pub paid_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
