//! # Data Models
//!
//! SeaORM entities for every table, plus the enums stored in their text
//! columns.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod client;
pub mod enums;
pub mod order;
pub mod order_item;
pub mod product;
pub mod transaction;
pub mod user;
pub mod workspace;
pub mod workspace_member;

pub use client::Entity as Client;
pub use enums::{MemberRole, OrderStatus, TransactionStatus, TransactionType};
pub use order::Entity as Order;
pub use order_item::Entity as OrderItem;
pub use product::Entity as Product;
pub use transaction::Entity as Transaction;
pub use user::Entity as User;
pub use workspace::Entity as Workspace;
pub use workspace_member::Entity as WorkspaceMember;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "mare".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
