//! Database migrations for the Maré ERP API.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_06_01_000001_create_workspaces;
mod m2025_06_01_000002_create_users;
mod m2025_06_01_000003_create_workspace_members;
mod m2025_06_01_000004_create_clients;
mod m2025_06_01_000005_create_products;
mod m2025_06_01_000006_create_orders;
mod m2025_06_01_000007_create_order_items;
mod m2025_06_01_000008_create_transactions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_06_01_000001_create_workspaces::Migration),
            Box::new(m2025_06_01_000002_create_users::Migration),
            Box::new(m2025_06_01_000003_create_workspace_members::Migration),
            Box::new(m2025_06_01_000004_create_clients::Migration),
            Box::new(m2025_06_01_000005_create_products::Migration),
            Box::new(m2025_06_01_000006_create_orders::Migration),
            Box::new(m2025_06_01_000007_create_order_items::Migration),
            Box::new(m2025_06_01_000008_create_transactions::Migration),
        ]
    }
}
