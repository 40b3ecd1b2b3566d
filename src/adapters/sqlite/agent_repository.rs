//! SQLite implementation of the AgentRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Agent, LegacyAggregate, MobileNetwork};
use crate::domain::ports::{AgentFilter, AgentRepository};

#[derive(Clone)]
pub struct SqliteAgentRepository {
    pool: SqlitePool,
}

impl SqliteAgentRepository {
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AgentRepository for SqliteAgentRepository {
    async fn create(&self, agent: &Agent) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO agents (id, name, phone, network, total_commissions, total_paid_out, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#
        )
        .bind(agent.id.to_string())
        .bind(&agent.name)
        .bind(&agent.phone)
        .bind(agent.network.map(|n| n.as_str()))
        .bind(agent.legacy.total_commissions)
        .bind(agent.legacy.total_paid_out)
        .bind(agent.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Agent>> {
        let row: Option<AgentRow> = sqlx::query_as("SELECT * FROM agents WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn get_by_phone(&self, phone: &str) -> DomainResult<Option<Agent>> {
        let row: Option<AgentRow> = sqlx::query_as("SELECT * FROM agents WHERE phone = ?")
            .bind(phone)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn list(&self, filter: AgentFilter) -> DomainResult<Vec<Agent>> {
        let mut sql = String::from("SELECT * FROM agents WHERE 1=1");
        let mut bindings: Vec<String> = Vec::new();

        if let Some(network) = &filter.network {
            sql.push_str(" AND network = ?");
            bindings.push(network.as_str().to_string());
        }
        if let Some(pattern) = &filter.name_pattern {
            sql.push_str(" AND name LIKE ?");
            bindings.push(pattern.replace('*', "%"));
        }

        sql.push_str(" ORDER BY created_at, id");
        // LIMIT -1 means unbounded in SQLite; OFFSET requires a LIMIT clause.
        let limit = filter.limit.map_or(-1, i64::from);
        let offset = filter.offset.map_or(0, i64::from);
        sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));

        let mut q = sqlx::query_as::<_, AgentRow>(&sql);
        for binding in &bindings {
            q = q.bind(binding);
        }

        let rows: Vec<AgentRow> = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn count(&self) -> DomainResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM agents")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}

#[derive(sqlx::FromRow)]
struct AgentRow {
    id: String,
    name: String,
    phone: String,
    network: Option<String>,
    total_commissions: Option<f64>,
    total_paid_out: Option<f64>,
    created_at: String,
}

impl TryFrom<AgentRow> for Agent {
    type Error = DomainError;

    fn try_from(row: AgentRow) -> Result<Self, Self::Error> {
        let network = row
            .network
            .as_deref()
            .map(|n| {
                MobileNetwork::parse_str(n)
                    .ok_or_else(|| DomainError::SerializationError(format!("Invalid network: {n}")))
            })
            .transpose()?;

        Ok(Self {
            id: super::parse_uuid(&row.id)?,
            name: row.name,
            phone: row.phone,
            network,
            legacy: LegacyAggregate {
                total_commissions: row.total_commissions,
                total_paid_out: row.total_paid_out,
            },
            created_at: super::parse_datetime(&row.created_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    async fn setup_test_repo() -> SqliteAgentRepository {
        let pool = create_migrated_test_pool().await.unwrap();
        SqliteAgentRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_get_agent() {
        let repo = setup_test_repo().await;
        let agent = Agent::new("Ama Mensah", "0241234567")
            .unwrap()
            .with_legacy(LegacyAggregate::new(10.0, 4.0));

        repo.create(&agent).await.unwrap();

        let found = repo.get(agent.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Ama Mensah");
        assert_eq!(found.network, Some(MobileNetwork::Mtn));
        assert_eq!(found.legacy, LegacyAggregate::new(10.0, 4.0));

        let by_phone = repo.get_by_phone("0241234567").await.unwrap();
        assert_eq!(by_phone.map(|a| a.id), Some(agent.id));
    }

    #[tokio::test]
    async fn test_duplicate_phone_rejected() {
        let repo = setup_test_repo().await;
        repo.create(&Agent::new("One", "0201234567").unwrap()).await.unwrap();

        let result = repo.create(&Agent::new("Two", "+233201234567").unwrap()).await;
        assert!(matches!(result, Err(DomainError::DatabaseError(_))));
    }

    #[tokio::test]
    async fn test_list_with_pagination_and_network() {
        let repo = setup_test_repo().await;
        repo.create(&Agent::new("Kofi", "0241111111").unwrap()).await.unwrap();
        repo.create(&Agent::new("Esi", "0201111111").unwrap()).await.unwrap();
        repo.create(&Agent::new("Yaw", "0271111111").unwrap()).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 3);

        let page = repo
            .list(AgentFilter { limit: Some(2), offset: Some(0), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(page.len(), 2);

        let rest = repo
            .list(AgentFilter { limit: Some(2), offset: Some(2), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(rest.len(), 1);

        let telecel = repo
            .list(AgentFilter { network: Some(MobileNetwork::Telecel), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(telecel.len(), 1);
        assert_eq!(telecel[0].name, "Esi");
    }
}
