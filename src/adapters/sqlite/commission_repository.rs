//! SQLite implementation of the CommissionRepository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{CommissionRecord, CommissionStatus, SourceType};
use crate::domain::ports::CommissionRepository;

#[derive(Clone)]
pub struct SqliteCommissionRepository {
    pool: SqlitePool,
}

impl SqliteCommissionRepository {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommissionRepository for SqliteCommissionRepository {
    async fn create(&self, record: &CommissionRecord) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO commissions (id, agent_id, source_type, source_id, amount, status,
               withdrawal_id, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#
        )
        .bind(record.id.to_string())
        .bind(record.agent_id.to_string())
        .bind(record.source_type.as_str())
        .bind(&record.source_id)
        .bind(record.amount)
        .bind(record.status.as_str())
        .bind(record.withdrawal_id.map(|id| id.to_string()))
        .bind(record.created_at.to_rfc3339())
        .bind(record.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<CommissionRecord>> {
        let row: Option<CommissionRow> = sqlx::query_as("SELECT * FROM commissions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn list_by_agent(&self, agent_id: Uuid) -> DomainResult<Vec<CommissionRecord>> {
        let rows: Vec<CommissionRow> = sqlx::query_as(
            "SELECT * FROM commissions WHERE agent_id = ? ORDER BY created_at ASC, id ASC"
        )
        .bind(agent_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn list_recent_by_agent(
        &self,
        agent_id: Uuid,
        limit: u32,
    ) -> DomainResult<Vec<CommissionRecord>> {
        let rows: Vec<CommissionRow> = sqlx::query_as(
            "SELECT * FROM commissions WHERE agent_id = ? ORDER BY created_at DESC, id DESC LIMIT ?"
        )
        .bind(agent_id.to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn list_by_withdrawal(&self, withdrawal_id: Uuid) -> DomainResult<Vec<CommissionRecord>> {
        let rows: Vec<CommissionRow> = sqlx::query_as(
            "SELECT * FROM commissions WHERE withdrawal_id = ? ORDER BY created_at ASC, id ASC"
        )
        .bind(withdrawal_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn update_status(&self, id: Uuid, status: CommissionStatus) -> DomainResult<()> {
        let result = sqlx::query("UPDATE commissions SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::CommissionNotFound(id));
        }

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct CommissionRow {
    id: String,
    agent_id: String,
    source_type: String,
    source_id: String,
    amount: Option<f64>,
    status: String,
    withdrawal_id: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<CommissionRow> for CommissionRecord {
    type Error = DomainError;

    fn try_from(row: CommissionRow) -> Result<Self, Self::Error> {
        let source_type = SourceType::parse_str(&row.source_type).ok_or_else(|| {
            DomainError::SerializationError(format!("Invalid source type: {}", row.source_type))
        })?;
        let status = CommissionStatus::parse_str(&row.status).ok_or_else(|| {
            DomainError::SerializationError(format!("Invalid status: {}", row.status))
        })?;

        Ok(Self {
            id: super::parse_uuid(&row.id)?,
            agent_id: super::parse_uuid(&row.agent_id)?,
            source_type,
            source_id: row.source_id,
            amount: row.amount,
            status,
            withdrawal_id: super::parse_optional_uuid(row.withdrawal_id)?,
            created_at: super::parse_datetime(&row.created_at)?,
            updated_at: super::parse_datetime(&row.updated_at)?,
        })
    }
}
