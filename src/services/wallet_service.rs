//! Wallet service: agent registration, commission recording and the
//! withdrawal lifecycle.
//!
//! Every mutation drops the affected agent's cached dashboard and all
//! cached admin dashboard pages, so reads after a write never see the
//! pre-write figures.

use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::adapters::cache::{wallet_key, DashboardCache, ADMIN_DASHBOARD_PREFIX};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Agent, CommissionRecord, CommissionStatus, LegacyAggregate, SourceType, WalletSummary,
    WithdrawalRequest, WithdrawalStatus,
};
use crate::domain::ports::{AgentFilter, AgentRepository, CommissionRepository, WithdrawalRepository};
use crate::services::ledger;

pub struct WalletService<A, C, W>
where
    A: AgentRepository,
    C: CommissionRepository,
    W: WithdrawalRepository,
{
    agents: Arc<A>,
    commissions: Arc<C>,
    withdrawals: Arc<W>,
    cache: DashboardCache,
}

impl<A, C, W> WalletService<A, C, W>
where
    A: AgentRepository,
    C: CommissionRepository,
    W: WithdrawalRepository,
{
    pub fn new(agents: Arc<A>, commissions: Arc<C>, withdrawals: Arc<W>, cache: DashboardCache) -> Self {
        Self {
            agents,
            commissions,
            withdrawals,
            cache,
        }
    }

    fn invalidate_dashboards(&self, agent_id: Uuid) {
        self.cache.invalidate(&wallet_key(agent_id));
        let dropped = self.cache.invalidate_prefix(ADMIN_DASHBOARD_PREFIX);
        debug!(%agent_id, admin_pages = dropped, "invalidated cached dashboards");
    }

    /// Register an agent. The phone number is normalised and its network
    /// detected from the prefix.
    pub async fn register_agent(
        &self,
        name: &str,
        phone: &str,
        legacy: Option<LegacyAggregate>,
    ) -> DomainResult<Agent> {
        if name.trim().is_empty() {
            return Err(DomainError::ValidationFailed("agent name cannot be empty".to_string()));
        }

        let mut agent = Agent::new(name.trim(), phone).map_err(DomainError::ValidationFailed)?;
        if let Some(legacy) = legacy {
            agent = agent.with_legacy(legacy);
        }

        if self.agents.get_by_phone(&agent.phone).await?.is_some() {
            return Err(DomainError::ValidationFailed(format!(
                "an agent with phone {} is already registered",
                agent.phone
            )));
        }

        self.agents.create(&agent).await?;
        self.cache.invalidate_prefix(ADMIN_DASHBOARD_PREFIX);
        info!(agent_id = %agent.id, phone = %agent.phone, network = ?agent.network, "agent registered");

        Ok(agent)
    }

    pub async fn get_agent(&self, id: Uuid) -> DomainResult<Agent> {
        self.agents.get(id).await?.ok_or(DomainError::AgentNotFound(id))
    }

    /// Look an agent up by phone number in any accepted format.
    pub async fn find_agent_by_phone(&self, phone: &str) -> DomainResult<Option<Agent>> {
        match crate::domain::models::normalize_phone(phone) {
            Some(normalized) => self.agents.get_by_phone(&normalized).await,
            None => Ok(None),
        }
    }

    pub async fn list_agents(&self, filter: AgentFilter) -> DomainResult<Vec<Agent>> {
        self.agents.list(filter).await
    }

    /// Record a commission. Amounts outside `[0, 0.4]` are rejected before
    /// anything is written.
    #[instrument(skip(self, source_id))]
    pub async fn record_commission(
        &self,
        agent_id: Uuid,
        source_type: SourceType,
        source_id: &str,
        amount: f64,
        status: CommissionStatus,
    ) -> DomainResult<CommissionRecord> {
        let check = ledger::meets_constraints(amount);
        if let Some(error) = check.error {
            return Err(DomainError::ValidationFailed(error));
        }
        if !matches!(status, CommissionStatus::Pending | CommissionStatus::Earned) {
            return Err(DomainError::ValidationFailed(format!(
                "new commissions must be pending or earned, not {status}"
            )));
        }
        if source_id.trim().is_empty() {
            return Err(DomainError::ValidationFailed("source id cannot be empty".to_string()));
        }

        self.get_agent(agent_id).await?;

        let record = CommissionRecord::new(agent_id, source_type, source_id.trim(), amount, status);
        self.commissions.create(&record).await?;
        self.invalidate_dashboards(agent_id);
        info!(commission_id = %record.id, amount, status = %record.status, "commission recorded");

        Ok(record)
    }

    /// Confirm a pending commission so it becomes withdrawable.
    pub async fn confirm_commission(&self, id: Uuid) -> DomainResult<CommissionRecord> {
        let mut record = self
            .commissions
            .get(id)
            .await?
            .ok_or(DomainError::CommissionNotFound(id))?;

        let from = record.status;
        record
            .transition_to(CommissionStatus::Earned)
            .map_err(|reason| DomainError::InvalidStateTransition {
                from: from.to_string(),
                to: CommissionStatus::Earned.to_string(),
                reason,
            })?;

        self.commissions.update_status(id, record.status).await?;
        self.invalidate_dashboards(record.agent_id);
        info!(commission_id = %id, "commission confirmed");

        Ok(record)
    }

    pub async fn get_commission(&self, id: Uuid) -> DomainResult<CommissionRecord> {
        self.commissions.get(id).await?.ok_or(DomainError::CommissionNotFound(id))
    }

    pub async fn list_commissions(&self, agent_id: Uuid) -> DomainResult<Vec<CommissionRecord>> {
        self.get_agent(agent_id).await?;
        self.commissions.list_by_agent(agent_id).await
    }

    /// Current wallet figures for an agent, read straight from the store.
    pub async fn wallet_summary(&self, agent_id: Uuid) -> DomainResult<WalletSummary> {
        let agent = self.get_agent(agent_id).await?;
        self.summary_for(&agent).await
    }

    pub(crate) async fn summary_for(&self, agent: &Agent) -> DomainResult<WalletSummary> {
        let records = self.commissions.list_by_agent(agent.id).await?;
        let in_flight = self.withdrawals.list_in_flight(agent.id).await?;
        Ok(ledger::summarize(&records, Some(&agent.legacy), &in_flight))
    }

    /// Reserve every earned commission for a new withdrawal request.
    ///
    /// Agents with only a legacy balance withdraw the whole available legacy
    /// amount instead.
    #[instrument(skip(self))]
    pub async fn request_withdrawal(&self, agent_id: Uuid) -> DomainResult<WithdrawalRequest> {
        self.get_agent(agent_id).await?;

        let request = self.withdrawals.open(agent_id).await?;
        self.invalidate_dashboards(agent_id);
        info!(withdrawal_id = %request.id, amount = request.amount, source = %request.source, "withdrawal requested");

        Ok(request)
    }

    pub async fn list_withdrawals(&self, agent_id: Uuid) -> DomainResult<Vec<WithdrawalRequest>> {
        self.get_agent(agent_id).await?;
        self.withdrawals.list_by_agent(agent_id).await
    }

    /// Mark a pending withdrawal as being paid out.
    pub async fn process_withdrawal(&self, id: Uuid) -> DomainResult<WithdrawalRequest> {
        let request = self.withdrawals.begin_processing(id).await?;
        self.invalidate_dashboards(request.agent_id);
        Ok(request)
    }

    /// Mark a withdrawal paid. Its reserved commissions become withdrawn; a
    /// legacy withdrawal is added to the agent's legacy paid-out total.
    #[instrument(skip(self))]
    pub async fn complete_withdrawal(&self, id: Uuid) -> DomainResult<WithdrawalRequest> {
        let request = self.withdrawals.resolve(id, WithdrawalStatus::Paid).await?;
        self.invalidate_dashboards(request.agent_id);
        info!(withdrawal_id = %id, amount = request.amount, source = %request.source, "withdrawal paid");

        Ok(request)
    }

    /// Reject a withdrawal and release its reserved commissions.
    #[instrument(skip(self))]
    pub async fn reject_withdrawal(&self, id: Uuid) -> DomainResult<WithdrawalRequest> {
        let request = self.withdrawals.resolve(id, WithdrawalStatus::Rejected).await?;
        self.invalidate_dashboards(request.agent_id);
        info!(withdrawal_id = %id, "withdrawal rejected");

        Ok(request)
    }
}
