//! Read models served on agent and admin dashboards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Agent, CommissionRecord, MobileNetwork, WalletSummary};

/// Everything an agent sees on their own dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDashboard {
    pub agent: Agent,
    pub wallet: WalletSummary,
    /// Most recent commissions first; empty when the agent has none yet
    pub recent_commissions: Vec<CommissionRecord>,
    pub last_commission_at: Option<DateTime<Utc>>,
}

/// One agent's line on the admin overview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminDashboardRow {
    pub agent_id: Uuid,
    pub name: String,
    pub phone: String,
    pub network: Option<MobileNetwork>,
    pub wallet: WalletSummary,
    pub last_commission_at: Option<DateTime<Utc>>,
}

/// A page of the admin overview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminDashboard {
    pub limit: u32,
    pub offset: u32,
    pub rows: Vec<AdminDashboardRow>,
    pub total_agents: u64,
}
