//! Data layer module
//!
//! Handles all data persistence and caching:
//! - SQLite database operations
//! - Account cache (volatile)

mod cache;
mod database;
mod models;

pub use cache::AccountCache;
pub use database::Database;
pub use models::*;

#[cfg(test)]
mod database_test;
