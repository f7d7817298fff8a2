//! # Maré Business Management API
//!
//! Multi-tenant ERP backend: workspaces, clients, products, orders and
//! financial transactions behind cookie-based JWT sessions.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod seeds;
pub mod server;
pub mod telemetry;
pub use migration;
