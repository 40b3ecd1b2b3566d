//! Agent and admin dashboards served through the request cache.
//!
//! Payloads are cached as JSON so the cache stays payload-agnostic; a cold
//! key is loaded once no matter how many requests arrive together.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::adapters::cache::{admin_dashboard_key, wallet_key, DashboardCache};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AdminDashboard, AdminDashboardRow, Agent, AgentDashboard, CacheConfig, CommissionRecord,
    WalletSummary,
};
use crate::domain::ports::{AgentFilter, AgentRepository, CommissionRepository, WithdrawalRepository};
use crate::services::ledger;
use crate::services::retry::RetryPolicy;

/// Largest admin dashboard page served in one request.
pub const MAX_PAGE_SIZE: u32 = 500;

pub struct DashboardService<A, C, W>
where
    A: AgentRepository,
    C: CommissionRepository,
    W: WithdrawalRepository,
{
    agents: Arc<A>,
    commissions: Arc<C>,
    withdrawals: Arc<W>,
    cache: DashboardCache,
    ttl: Duration,
    recent_limit: u32,
    retry: RetryPolicy,
}

impl<A, C, W> DashboardService<A, C, W>
where
    A: AgentRepository + 'static,
    C: CommissionRepository + 'static,
    W: WithdrawalRepository + 'static,
{
    pub fn new(
        agents: Arc<A>,
        commissions: Arc<C>,
        withdrawals: Arc<W>,
        cache: DashboardCache,
        config: &CacheConfig,
    ) -> Self {
        Self {
            agents,
            commissions,
            withdrawals,
            cache,
            ttl: Duration::from_millis(config.dashboard_ttl_ms),
            recent_limit: config.recent_commissions,
            retry: RetryPolicy::none(),
        }
    }

    /// Retry transient storage failures while loading a cold dashboard.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Dashboard for one agent: profile, wallet and latest commissions.
    pub async fn agent_dashboard(&self, agent_id: Uuid) -> DomainResult<AgentDashboard> {
        let agents = Arc::clone(&self.agents);
        let commissions = Arc::clone(&self.commissions);
        let withdrawals = Arc::clone(&self.withdrawals);
        let retry = self.retry.clone();
        let recent_limit = self.recent_limit;

        let value = self
            .cache
            .get_or_fetch(
                &wallet_key(agent_id),
                move || async move {
                    let dashboard = retry
                        .execute_when(
                            || {
                                load_agent_dashboard(
                                    agents.as_ref(),
                                    commissions.as_ref(),
                                    withdrawals.as_ref(),
                                    agent_id,
                                    recent_limit,
                                )
                            },
                            DomainError::is_transient,
                        )
                        .await?;
                    Ok::<_, DomainError>(serde_json::to_value(dashboard)?)
                },
                self.ttl,
            )
            .await
            .map_err(Arc::unwrap_or_clone)?;

        Ok(serde_json::from_value(value)?)
    }

    /// One page of the admin overview, ordered by registration.
    pub async fn admin_dashboard(&self, limit: u32, offset: u32) -> DomainResult<AdminDashboard> {
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(DomainError::ValidationFailed(format!(
                "page size must be between 1 and {MAX_PAGE_SIZE}, got {limit}"
            )));
        }

        let agents = Arc::clone(&self.agents);
        let commissions = Arc::clone(&self.commissions);
        let withdrawals = Arc::clone(&self.withdrawals);
        let retry = self.retry.clone();

        let value = self
            .cache
            .get_or_fetch(
                &admin_dashboard_key(limit, offset),
                move || async move {
                    let dashboard = retry
                        .execute_when(
                            || {
                                load_admin_dashboard(
                                    agents.as_ref(),
                                    commissions.as_ref(),
                                    withdrawals.as_ref(),
                                    limit,
                                    offset,
                                )
                            },
                            DomainError::is_transient,
                        )
                        .await?;
                    Ok::<_, DomainError>(serde_json::to_value(dashboard)?)
                },
                self.ttl,
            )
            .await
            .map_err(Arc::unwrap_or_clone)?;

        Ok(serde_json::from_value(value)?)
    }
}

fn last_commission_at(records: &[CommissionRecord]) -> Option<chrono::DateTime<chrono::Utc>> {
    records.iter().map(|r| r.created_at).max()
}

async fn wallet_for<C, W>(
    agent: &Agent,
    commissions: &C,
    withdrawals: &W,
) -> DomainResult<(WalletSummary, Vec<CommissionRecord>)>
where
    C: CommissionRepository,
    W: WithdrawalRepository,
{
    let records = commissions.list_by_agent(agent.id).await?;
    let in_flight = withdrawals.list_in_flight(agent.id).await?;
    let wallet = ledger::summarize(&records, Some(&agent.legacy), &in_flight);
    Ok((wallet, records))
}

async fn load_agent_dashboard<A, C, W>(
    agents: &A,
    commissions: &C,
    withdrawals: &W,
    agent_id: Uuid,
    recent_limit: u32,
) -> DomainResult<AgentDashboard>
where
    A: AgentRepository,
    C: CommissionRepository,
    W: WithdrawalRepository,
{
    let agent = agents.get(agent_id).await?.ok_or(DomainError::AgentNotFound(agent_id))?;
    let (wallet, records) = wallet_for(&agent, commissions, withdrawals).await?;
    let recent_commissions = commissions.list_recent_by_agent(agent_id, recent_limit).await?;
    debug!(%agent_id, records = records.len(), "loaded agent dashboard");

    Ok(AgentDashboard {
        last_commission_at: last_commission_at(&records),
        agent,
        wallet,
        recent_commissions,
    })
}

async fn load_admin_dashboard<A, C, W>(
    agents: &A,
    commissions: &C,
    withdrawals: &W,
    limit: u32,
    offset: u32,
) -> DomainResult<AdminDashboard>
where
    A: AgentRepository,
    C: CommissionRepository,
    W: WithdrawalRepository,
{
    let total_agents = agents.count().await?;
    let page = agents
        .list(AgentFilter {
            limit: Some(limit),
            offset: Some(offset),
            ..Default::default()
        })
        .await?;

    let mut rows = Vec::with_capacity(page.len());
    for agent in page {
        let (wallet, records) = wallet_for(&agent, commissions, withdrawals).await?;
        rows.push(AdminDashboardRow {
            agent_id: agent.id,
            name: agent.name,
            phone: agent.phone,
            network: agent.network,
            wallet,
            last_commission_at: last_commission_at(&records),
        });
    }
    debug!(limit, offset, rows = rows.len(), total_agents, "loaded admin dashboard");

    Ok(AdminDashboard {
        limit,
        offset,
        rows,
        total_agents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{
        create_migrated_test_pool, SqliteAgentRepository, SqliteCommissionRepository,
        SqliteWithdrawalRepository,
    };
    use crate::domain::models::{CommissionStatus, LegacyAggregate, SourceType};

    struct Fixture {
        agents: Arc<SqliteAgentRepository>,
        commissions: Arc<SqliteCommissionRepository>,
        cache: DashboardCache,
        service: DashboardService<SqliteAgentRepository, SqliteCommissionRepository, SqliteWithdrawalRepository>,
    }

    async fn setup() -> Fixture {
        let pool = create_migrated_test_pool().await.unwrap();
        let agents = Arc::new(SqliteAgentRepository::new(pool.clone()));
        let commissions = Arc::new(SqliteCommissionRepository::new(pool.clone()));
        let withdrawals = Arc::new(SqliteWithdrawalRepository::new(pool));
        let cache = DashboardCache::new();
        let service = DashboardService::new(
            Arc::clone(&agents),
            Arc::clone(&commissions),
            withdrawals,
            cache.clone(),
            &CacheConfig::default(),
        );
        Fixture {
            agents,
            commissions,
            cache,
            service,
        }
    }

    #[tokio::test]
    async fn test_agent_dashboard_is_cached() {
        let f = setup().await;
        let agent = Agent::new("Kojo", "0241234567").unwrap();
        f.agents.create(&agent).await.unwrap();

        let first = f.service.agent_dashboard(agent.id).await.unwrap();
        assert!(first.recent_commissions.is_empty());
        assert!(first.last_commission_at.is_none());

        // Written behind the service's back, so the cached view stays put.
        let record = CommissionRecord::new(agent.id, SourceType::DataOrder, "o-1", 0.3, CommissionStatus::Earned);
        f.commissions.create(&record).await.unwrap();

        let cached = f.service.agent_dashboard(agent.id).await.unwrap();
        assert!(cached.recent_commissions.is_empty());

        f.cache.invalidate(&wallet_key(agent.id));
        let fresh = f.service.agent_dashboard(agent.id).await.unwrap();
        assert_eq!(fresh.recent_commissions.len(), 1);
        assert!((fresh.wallet.available_balance - 0.3).abs() < 1e-9);
        assert_eq!(fresh.last_commission_at, Some(record.created_at));
    }

    #[tokio::test]
    async fn test_missing_agent_is_not_cached() {
        let f = setup().await;
        let id = Uuid::new_v4();
        let result = f.service.agent_dashboard(id).await;
        assert!(matches!(result, Err(DomainError::AgentNotFound(_))));
        assert!(f.cache.is_empty());
        assert_eq!(f.cache.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_admin_dashboard_pages() {
        let f = setup().await;
        for (i, phone) in ["0241000001", "0201000002", "0271000003"].iter().enumerate() {
            let agent = Agent::new(format!("Agent {i}"), phone)
                .unwrap()
                .with_legacy(LegacyAggregate::new(2.0, 0.5));
            f.agents.create(&agent).await.unwrap();
        }

        let page = f.service.admin_dashboard(2, 0).await.unwrap();
        assert_eq!(page.total_agents, 3);
        assert_eq!(page.rows.len(), 2);
        assert!((page.rows[0].wallet.available_balance - 1.5).abs() < 1e-9);
        assert!(page.rows[0].last_commission_at.is_none());

        let rest = f.service.admin_dashboard(2, 2).await.unwrap();
        assert_eq!(rest.rows.len(), 1);
        assert_eq!(f.cache.len(), 2);

        assert!(matches!(
            f.service.admin_dashboard(0, 0).await,
            Err(DomainError::ValidationFailed(_))
        ));
    }
}
