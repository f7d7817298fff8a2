//! Database seeding functionality
//!
//! Populates a fresh database with a demo workspace so the API can be
//! explored without registering first.

pub mod demo;

pub use demo::{DEMO_EMAIL, DEMO_PASSWORD, seed_demo};
