//! Adapters for the DataFlex ports: SQLite persistence and the in-memory
//! request cache.

pub mod cache;
pub mod sqlite;
