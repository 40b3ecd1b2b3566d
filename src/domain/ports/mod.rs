//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces that infrastructure adapters implement:
//! - AgentRepository: agent accounts and their legacy aggregates
//! - CommissionRepository: per-record commissions
//! - WithdrawalRepository: withdrawal requests
//!
//! Services depend on these traits, not on concrete stores.

pub mod agent_repository;
pub mod commission_repository;
pub mod withdrawal_repository;

pub use agent_repository::{AgentFilter, AgentRepository};
pub use commission_repository::CommissionRepository;
pub use withdrawal_repository::WithdrawalRepository;
