//! Domain errors for the DataFlex ledger.

use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors that can occur in the DataFlex system.
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    #[error("Agent not found: {0}")]
    AgentNotFound(Uuid),

    #[error("Commission not found: {0}")]
    CommissionNotFound(Uuid),

    #[error("Withdrawal not found: {0}")]
    WithdrawalNotFound(Uuid),

    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidStateTransition { from: String, to: String, reason: String },

    #[error("Insufficient balance for agent {agent_id}: available {available:.2}")]
    InsufficientBalance { agent_id: Uuid, available: f64 },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Whether retrying the same operation might succeed.
    ///
    /// Only storage failures qualify; everything else is a property of the
    /// request itself.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::DatabaseError(_))
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
