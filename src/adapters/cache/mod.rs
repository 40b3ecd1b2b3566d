//! In-memory caching layer for dashboard reads.
//!
//! Dashboard payloads are cached as JSON under string keys so the wallet
//! service can invalidate by key or prefix without knowing payload types.

pub mod request_cache;

pub use request_cache::{FetchResult, RequestCache};

use uuid::Uuid;

use crate::domain::errors::DomainError;

/// Cache shared by the dashboard and wallet services.
pub type DashboardCache = RequestCache<serde_json::Value, DomainError>;

/// Prefix for every cached admin dashboard page.
pub const ADMIN_DASHBOARD_PREFIX: &str = "agents:dashboard:";

/// Key for an agent's wallet view.
pub fn wallet_key(agent_id: Uuid) -> String {
    format!("agents:wallet:{agent_id}")
}

/// Key for one page of the admin dashboard.
pub fn admin_dashboard_key(limit: u32, offset: u32) -> String {
    format!("{ADMIN_DASHBOARD_PREFIX}{limit}:{offset}")
}
