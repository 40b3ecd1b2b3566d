//! CLI command implementations.

pub mod agent;
pub mod commission;
pub mod dashboard;
pub mod init;
pub mod phone;
pub mod wallet;
pub mod withdraw;
