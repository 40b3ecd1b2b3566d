//! Withdrawal repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{WithdrawalRequest, WithdrawalStatus};

/// Repository interface for withdrawal requests.
///
/// Opening and resolving a request also changes the commissions it covers.
/// Implementations must apply each of these as one atomic unit, and must
/// re-check the request's status as part of that unit, so that two callers
/// racing on the same request cannot both succeed.
#[async_trait]
pub trait WithdrawalRepository: Send + Sync {
    async fn create(&self, request: &WithdrawalRequest) -> DomainResult<()>;

    async fn get(&self, id: Uuid) -> DomainResult<Option<WithdrawalRequest>>;

    /// Open a request for everything the agent can withdraw.
    ///
    /// Every `earned` record is reserved for the new request. With nothing to
    /// reserve, an agent on the legacy aggregate withdraws the whole available
    /// legacy amount. Anything else is `InsufficientBalance`, and nothing is
    /// written.
    async fn open(&self, agent_id: Uuid) -> DomainResult<WithdrawalRequest>;

    /// Move a pending request to processing.
    async fn begin_processing(&self, id: Uuid) -> DomainResult<WithdrawalRequest>;

    /// Move an in-flight request to `Paid` or `Rejected` and settle its
    /// funding: reserved records become withdrawn or earned again, and a paid
    /// legacy request is added to the agent's legacy paid-out total.
    async fn resolve(&self, id: Uuid, status: WithdrawalStatus) -> DomainResult<WithdrawalRequest>;

    /// All requests for an agent, newest first.
    async fn list_by_agent(&self, agent_id: Uuid) -> DomainResult<Vec<WithdrawalRequest>>;

    /// Pending or processing requests for an agent.
    async fn list_in_flight(&self, agent_id: Uuid) -> DomainResult<Vec<WithdrawalRequest>>;
}
