//! SQLite implementation of the WithdrawalRepository.
//!
//! Opening, processing and resolving a withdrawal each run in one
//! transaction, and each starts with a write. The first write takes SQLite's
//! write lock, so concurrent callers on the same database are serialized and
//! every read that follows sees the latest committed state.
//!
//! Status changes are conditional `UPDATE`s on the statuses the transition
//! may start from. When no row matches, the request is read back only to
//! report why the transition was refused.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::commission_repository::CommissionRow;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    BalanceSource, CommissionRecord, CommissionStatus, LegacyAggregate, WalletSummary,
    WithdrawalRequest, WithdrawalSource, WithdrawalStatus,
};
use crate::domain::ports::WithdrawalRepository;
use crate::services::ledger;

#[derive(Clone)]
pub struct SqliteWithdrawalRepository {
    pool: SqlitePool,
}

impl SqliteWithdrawalRepository {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WithdrawalRepository for SqliteWithdrawalRepository {
    async fn create(&self, request: &WithdrawalRequest) -> DomainResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert(&mut conn, request).await
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<WithdrawalRequest>> {
        let row: Option<WithdrawalRow> = sqlx::query_as("SELECT * FROM withdrawals WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn open(&self, agent_id: Uuid) -> DomainResult<WithdrawalRequest> {
        let mut tx = self.pool.begin().await?;

        let mut request = WithdrawalRequest::new(Uuid::new_v4(), agent_id, 0.0);
        insert(&mut tx, &request).await?;

        let reserved = sqlx::query(
            r#"UPDATE commissions SET status = ?, withdrawal_id = ?, updated_at = ?
               WHERE agent_id = ? AND status = ?"#
        )
        .bind(CommissionStatus::PendingWithdrawal.as_str())
        .bind(request.id.to_string())
        .bind(Utc::now().to_rfc3339())
        .bind(agent_id.to_string())
        .bind(CommissionStatus::Earned.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if reserved > 0 {
            let rows: Vec<CommissionRow> =
                sqlx::query_as("SELECT * FROM commissions WHERE withdrawal_id = ?")
                    .bind(request.id.to_string())
                    .fetch_all(&mut *tx)
                    .await?;
            let records = rows
                .into_iter()
                .map(CommissionRecord::try_from)
                .collect::<DomainResult<Vec<_>>>()?;
            request.amount = records.iter().map(ledger::effective_amount).sum();
        } else {
            let summary = wallet_excluding(&mut tx, agent_id, request.id).await?;
            if summary.source != BalanceSource::Legacy || summary.available_balance <= 0.0 {
                tx.rollback().await?;
                return Err(DomainError::InsufficientBalance {
                    agent_id,
                    available: summary.available_balance,
                });
            }
            request.amount = summary.available_balance;
            request.source = WithdrawalSource::Legacy;
        }

        sqlx::query("UPDATE withdrawals SET amount = ?, source = ? WHERE id = ?")
            .bind(request.amount)
            .bind(request.source.as_str())
            .bind(request.id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!(withdrawal_id = %request.id, %agent_id, records = reserved, source = %request.source, "withdrawal opened");

        Ok(request)
    }

    async fn begin_processing(&self, id: Uuid) -> DomainResult<WithdrawalRequest> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE withdrawals SET status = ? WHERE id = ? AND status = ?")
            .bind(WithdrawalStatus::Processing.as_str())
            .bind(id.to_string())
            .bind(WithdrawalStatus::Pending.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if updated == 0 {
            let current = fetch(&mut tx, id).await?;
            let reason = current
                .clone()
                .begin_processing()
                .err()
                .unwrap_or_else(|| format!("withdrawal {id} changed while being processed"));
            return Err(transition_error(current.status, WithdrawalStatus::Processing, reason));
        }

        let request = fetch(&mut tx, id).await?;
        tx.commit().await?;
        Ok(request)
    }

    async fn resolve(&self, id: Uuid, status: WithdrawalStatus) -> DomainResult<WithdrawalRequest> {
        let mut tx = self.pool.begin().await?;

        let updated = if status.is_terminal() {
            sqlx::query(
                "UPDATE withdrawals SET status = ?, resolved_at = ? WHERE id = ? AND status IN ('pending', 'processing')",
            )
            .bind(status.as_str())
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?
            .rows_affected()
        } else {
            0
        };
        if updated == 0 {
            let current = fetch(&mut tx, id).await?;
            let reason = current
                .clone()
                .resolve(status)
                .err()
                .unwrap_or_else(|| format!("withdrawal {id} changed while being resolved"));
            return Err(transition_error(current.status, status, reason));
        }

        let request = fetch(&mut tx, id).await?;

        // Paid keeps the link to the withdrawal; rejected releases it.
        let settle = match status {
            WithdrawalStatus::Paid => {
                "UPDATE commissions SET status = 'withdrawn', updated_at = ? WHERE withdrawal_id = ? AND status = 'pending_withdrawal'"
            }
            _ => {
                "UPDATE commissions SET status = 'earned', withdrawal_id = NULL, updated_at = ? WHERE withdrawal_id = ? AND status = 'pending_withdrawal'"
            }
        };
        let settled = sqlx::query(settle)
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if status == WithdrawalStatus::Paid && request.source == WithdrawalSource::Legacy {
            sqlx::query(
                "UPDATE agents SET total_paid_out = COALESCE(total_paid_out, 0) + ? WHERE id = ?",
            )
            .bind(request.amount)
            .bind(request.agent_id.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(withdrawal_id = %id, %status, records = settled, "withdrawal resolved");

        Ok(request)
    }

    async fn list_by_agent(&self, agent_id: Uuid) -> DomainResult<Vec<WithdrawalRequest>> {
        let rows: Vec<WithdrawalRow> = sqlx::query_as(
            "SELECT * FROM withdrawals WHERE agent_id = ? ORDER BY requested_at DESC"
        )
        .bind(agent_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn list_in_flight(&self, agent_id: Uuid) -> DomainResult<Vec<WithdrawalRequest>> {
        let rows: Vec<WithdrawalRow> = sqlx::query_as(
            "SELECT * FROM withdrawals WHERE agent_id = ? AND status IN ('pending', 'processing') ORDER BY requested_at DESC"
        )
        .bind(agent_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }
}

async fn insert(conn: &mut SqliteConnection, request: &WithdrawalRequest) -> DomainResult<()> {
    sqlx::query(
        r#"INSERT INTO withdrawals (id, agent_id, amount, source, status, requested_at, resolved_at)
           VALUES (?, ?, ?, ?, ?, ?, ?)"#
    )
    .bind(request.id.to_string())
    .bind(request.agent_id.to_string())
    .bind(request.amount)
    .bind(request.source.as_str())
    .bind(request.status.as_str())
    .bind(request.requested_at.to_rfc3339())
    .bind(request.resolved_at.map(|t| t.to_rfc3339()))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn fetch(conn: &mut SqliteConnection, id: Uuid) -> DomainResult<WithdrawalRequest> {
    let row: Option<WithdrawalRow> = sqlx::query_as("SELECT * FROM withdrawals WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

    row.ok_or(DomainError::WithdrawalNotFound(id))?.try_into()
}

/// Wallet figures for an agent as seen inside the current transaction,
/// leaving out the withdrawal being opened.
async fn wallet_excluding(
    conn: &mut SqliteConnection,
    agent_id: Uuid,
    withdrawal_id: Uuid,
) -> DomainResult<WalletSummary> {
    let legacy: Option<(Option<f64>, Option<f64>)> =
        sqlx::query_as("SELECT total_commissions, total_paid_out FROM agents WHERE id = ?")
            .bind(agent_id.to_string())
            .fetch_optional(&mut *conn)
            .await?;
    let (total_commissions, total_paid_out) = legacy.ok_or(DomainError::AgentNotFound(agent_id))?;
    let legacy = LegacyAggregate {
        total_commissions,
        total_paid_out,
    };

    let records: Vec<CommissionRow> = sqlx::query_as("SELECT * FROM commissions WHERE agent_id = ?")
        .bind(agent_id.to_string())
        .fetch_all(&mut *conn)
        .await?;
    let records = records
        .into_iter()
        .map(CommissionRecord::try_from)
        .collect::<DomainResult<Vec<_>>>()?;

    let in_flight: Vec<WithdrawalRow> = sqlx::query_as(
        "SELECT * FROM withdrawals WHERE agent_id = ? AND id != ? AND status IN ('pending', 'processing')"
    )
    .bind(agent_id.to_string())
    .bind(withdrawal_id.to_string())
    .fetch_all(&mut *conn)
    .await?;
    let in_flight = in_flight
        .into_iter()
        .map(WithdrawalRequest::try_from)
        .collect::<DomainResult<Vec<_>>>()?;

    Ok(ledger::summarize(&records, Some(&legacy), &in_flight))
}

fn transition_error(from: WithdrawalStatus, to: WithdrawalStatus, reason: String) -> DomainError {
    DomainError::InvalidStateTransition {
        from: from.to_string(),
        to: to.to_string(),
        reason,
    }
}

#[derive(sqlx::FromRow)]
struct WithdrawalRow {
    id: String,
    agent_id: String,
    amount: f64,
    source: String,
    status: String,
    requested_at: String,
    resolved_at: Option<String>,
}

impl TryFrom<WithdrawalRow> for WithdrawalRequest {
    type Error = DomainError;

    fn try_from(row: WithdrawalRow) -> Result<Self, Self::Error> {
        let status = WithdrawalStatus::parse_str(&row.status)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid status: {}", row.status)))?;
        let source = WithdrawalSource::parse_str(&row.source)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid source: {}", row.source)))?;

        Ok(Self {
            id: super::parse_uuid(&row.id)?,
            agent_id: super::parse_uuid(&row.agent_id)?,
            amount: row.amount,
            source,
            status,
            requested_at: super::parse_datetime(&row.requested_at)?,
            resolved_at: super::parse_optional_datetime(row.resolved_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{
        create_migrated_test_pool, SqliteAgentRepository, SqliteCommissionRepository,
    };
    use crate::domain::models::{Agent, SourceType};
    use crate::domain::ports::{AgentRepository, CommissionRepository};

    struct Fixture {
        withdrawals: SqliteWithdrawalRepository,
        commissions: SqliteCommissionRepository,
        agents: SqliteAgentRepository,
        agent: Agent,
    }

    async fn setup(agent: Agent) -> Fixture {
        let pool = create_migrated_test_pool().await.unwrap();
        let agents = SqliteAgentRepository::new(pool.clone());
        agents.create(&agent).await.unwrap();
        Fixture {
            withdrawals: SqliteWithdrawalRepository::new(pool.clone()),
            commissions: SqliteCommissionRepository::new(pool),
            agents,
            agent,
        }
    }

    async fn earn(f: &Fixture, source_id: &str, amount: f64, status: CommissionStatus) {
        let record = CommissionRecord::new(f.agent.id, SourceType::DataOrder, source_id, amount, status);
        f.commissions.create(&record).await.unwrap();
    }

    #[tokio::test]
    async fn test_in_flight_excludes_resolved() {
        let f = setup(Agent::new("Abena", "0501234567").unwrap()).await;
        let repo = &f.withdrawals;

        let open = WithdrawalRequest::new(Uuid::new_v4(), f.agent.id, 1.0);
        let paid = WithdrawalRequest::new(Uuid::new_v4(), f.agent.id, 2.0);
        repo.create(&open).await.unwrap();
        repo.create(&paid).await.unwrap();
        repo.resolve(paid.id, WithdrawalStatus::Paid).await.unwrap();

        let in_flight = repo.list_in_flight(f.agent.id).await.unwrap();
        assert_eq!(in_flight.len(), 1);
        assert_eq!(in_flight[0].id, open.id);

        let all = repo.list_by_agent(f.agent.id).await.unwrap();
        assert_eq!(all.len(), 2);

        let stored = repo.get(paid.id).await.unwrap().unwrap();
        assert_eq!(stored.status, WithdrawalStatus::Paid);
        assert!(stored.resolved_at.is_some());
    }

    #[tokio::test]
    async fn test_open_reserves_earned_records() {
        let f = setup(Agent::new("Kojo", "0241234567").unwrap()).await;
        earn(&f, "a", 0.1, CommissionStatus::Earned).await;
        earn(&f, "b", 0.2, CommissionStatus::Earned).await;
        earn(&f, "c", 0.3, CommissionStatus::Pending).await;

        let request = f.withdrawals.open(f.agent.id).await.unwrap();
        assert!((request.amount - 0.3).abs() < 1e-9);
        assert_eq!(request.source, WithdrawalSource::Records);

        let stored = f.withdrawals.get(request.id).await.unwrap().unwrap();
        assert!((stored.amount - 0.3).abs() < 1e-9);

        let reserved = f.commissions.list_by_withdrawal(request.id).await.unwrap();
        assert_eq!(reserved.len(), 2);
        assert!(reserved.iter().all(|r| r.status == CommissionStatus::PendingWithdrawal));
    }

    #[tokio::test]
    async fn test_refused_open_writes_nothing() {
        let f = setup(Agent::new("Adwoa", "0201234567").unwrap()).await;
        earn(&f, "a", 0.2, CommissionStatus::Pending).await;

        let result = f.withdrawals.open(f.agent.id).await;
        assert!(matches!(result, Err(DomainError::InsufficientBalance { .. })));
        assert!(f.withdrawals.list_by_agent(f.agent.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reject_releases_and_paid_keeps_link() {
        let f = setup(Agent::new("Yaa", "0551234567").unwrap()).await;
        earn(&f, "a", 0.1, CommissionStatus::Earned).await;
        earn(&f, "b", 0.2, CommissionStatus::Earned).await;

        let first = f.withdrawals.open(f.agent.id).await.unwrap();
        f.withdrawals.resolve(first.id, WithdrawalStatus::Rejected).await.unwrap();
        assert!(f.commissions.list_by_withdrawal(first.id).await.unwrap().is_empty());

        let second = f.withdrawals.open(f.agent.id).await.unwrap();
        f.withdrawals.begin_processing(second.id).await.unwrap();
        f.withdrawals.resolve(second.id, WithdrawalStatus::Paid).await.unwrap();
        let withdrawn = f.commissions.list_by_withdrawal(second.id).await.unwrap();
        assert_eq!(withdrawn.len(), 2);
        assert!(withdrawn.iter().all(|r| r.status == CommissionStatus::Withdrawn));
    }

    #[tokio::test]
    async fn test_resolve_twice_is_refused() {
        let f = setup(Agent::new("Fiifi", "0271234567").unwrap()).await;
        earn(&f, "a", 0.3, CommissionStatus::Earned).await;

        let request = f.withdrawals.open(f.agent.id).await.unwrap();
        f.withdrawals.resolve(request.id, WithdrawalStatus::Paid).await.unwrap();

        let again = f.withdrawals.resolve(request.id, WithdrawalStatus::Rejected).await;
        assert!(matches!(again, Err(DomainError::InvalidStateTransition { .. })));
        let reserved = f.commissions.list_by_withdrawal(request.id).await.unwrap();
        assert!(reserved.iter().all(|r| r.status == CommissionStatus::Withdrawn));

        let not_terminal = f.withdrawals.resolve(request.id, WithdrawalStatus::Processing).await;
        assert!(matches!(not_terminal, Err(DomainError::InvalidStateTransition { .. })));
    }

    #[tokio::test]
    async fn test_paid_legacy_withdrawal_raises_paid_out() {
        let agent = Agent::new("Akua", "0541234567")
            .unwrap()
            .with_legacy(LegacyAggregate::new(10.0, 4.0));
        let f = setup(agent).await;

        let request = f.withdrawals.open(f.agent.id).await.unwrap();
        assert_eq!(request.source, WithdrawalSource::Legacy);
        assert!((request.amount - 6.0).abs() < 1e-9);

        let second = f.withdrawals.open(f.agent.id).await;
        assert!(matches!(second, Err(DomainError::InsufficientBalance { .. })));

        f.withdrawals.resolve(request.id, WithdrawalStatus::Paid).await.unwrap();
        let agent = f.agents.get(f.agent.id).await.unwrap().unwrap();
        assert_eq!(agent.legacy.total_paid_out, Some(10.0));
    }

    #[tokio::test]
    async fn test_rejected_legacy_withdrawal_leaves_paid_out() {
        let agent = Agent::new("Ekow", "0261234567")
            .unwrap()
            .with_legacy(LegacyAggregate::new(5.0, 1.0));
        let f = setup(agent).await;

        let request = f.withdrawals.open(f.agent.id).await.unwrap();
        f.withdrawals.resolve(request.id, WithdrawalStatus::Rejected).await.unwrap();

        let agent = f.agents.get(f.agent.id).await.unwrap().unwrap();
        assert_eq!(agent.legacy.total_paid_out, Some(1.0));
    }

    #[tokio::test]
    async fn test_missing_withdrawal() {
        let f = setup(Agent::new("Esi", "0591234567").unwrap()).await;
        let result = f.withdrawals.resolve(Uuid::new_v4(), WithdrawalStatus::Paid).await;
        assert!(matches!(result, Err(DomainError::WithdrawalNotFound(_))));
        let result = f.withdrawals.begin_processing(Uuid::new_v4()).await;
        assert!(matches!(result, Err(DomainError::WithdrawalNotFound(_))));
    }
}
