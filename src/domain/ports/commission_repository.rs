//! Commission repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{CommissionRecord, CommissionStatus};

/// Repository interface for commission records.
///
/// Records are never deleted; only their status and withdrawal link change.
/// Reserving and settling records for a withdrawal belongs to the
/// [`WithdrawalRepository`](super::WithdrawalRepository), which does it in
/// the same transaction as the withdrawal's own status change.
#[async_trait]
pub trait CommissionRepository: Send + Sync {
    /// Persist a new record.
    async fn create(&self, record: &CommissionRecord) -> DomainResult<()>;

    /// Get a record by ID.
    async fn get(&self, id: Uuid) -> DomainResult<Option<CommissionRecord>>;

    /// All records for an agent, oldest first.
    async fn list_by_agent(&self, agent_id: Uuid) -> DomainResult<Vec<CommissionRecord>>;

    /// Most recent records for an agent, newest first.
    async fn list_recent_by_agent(
        &self,
        agent_id: Uuid,
        limit: u32,
    ) -> DomainResult<Vec<CommissionRecord>>;

    /// Records currently linked to a withdrawal request.
    async fn list_by_withdrawal(&self, withdrawal_id: Uuid) -> DomainResult<Vec<CommissionRecord>>;

    /// Update a record's status.
    async fn update_status(&self, id: Uuid, status: CommissionStatus) -> DomainResult<()>;
}
