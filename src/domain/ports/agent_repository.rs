//! Agent repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Agent, MobileNetwork};

/// Filter criteria for listing agents.
#[derive(Debug, Clone, Default)]
pub struct AgentFilter {
    pub network: Option<MobileNetwork>,
    pub name_pattern: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Repository interface for Agent persistence.
#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// Create a new agent.
    async fn create(&self, agent: &Agent) -> DomainResult<()>;

    /// Get an agent by ID.
    async fn get(&self, id: Uuid) -> DomainResult<Option<Agent>>;

    /// Get an agent by normalised phone number.
    async fn get_by_phone(&self, phone: &str) -> DomainResult<Option<Agent>>;

    /// List agents ordered by creation time.
    async fn list(&self, filter: AgentFilter) -> DomainResult<Vec<Agent>>;

    /// Count all agents.
    async fn count(&self) -> DomainResult<u64>;
}
