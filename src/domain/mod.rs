//! Domain layer for the DataFlex ledger
//!
//! Core models, errors, and the repository ports that adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
