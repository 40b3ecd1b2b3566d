use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a wallet summary's figures came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceSource {
    /// Summed from per-record commissions
    Records,
    /// Derived from the agent's legacy aggregate fields
    Legacy,
    /// Neither records nor legacy totals were available
    Empty,
}

impl BalanceSource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Records => "records",
            Self::Legacy => "legacy",
            Self::Empty => "empty",
        }
    }
}

/// A commission record whose stored amount failed the constraint check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionAnomaly {
    pub record_id: Uuid,
    pub original_amount: Option<f64>,
    pub clamped_amount: f64,
    pub reason: String,
}

/// Balances shown on an agent's wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletSummary {
    /// Lifetime earnings: earned, reserved and withdrawn commissions
    pub total_earned: f64,
    /// Commissions awaiting confirmation
    pub total_pending: f64,
    pub total_withdrawn: f64,
    /// Earned commissions not yet reserved for a withdrawal
    pub available_balance: f64,
    pub source: BalanceSource,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anomalies: Vec<CommissionAnomaly>,
}

impl WalletSummary {
    pub const fn empty() -> Self {
        Self {
            total_earned: 0.0,
            total_pending: 0.0,
            total_withdrawn: 0.0,
            available_balance: 0.0,
            source: BalanceSource::Empty,
            anomalies: Vec::new(),
        }
    }

    pub fn has_anomalies(&self) -> bool {
        !self.anomalies.is_empty()
    }
}

impl Default for WalletSummary {
    fn default() -> Self {
        Self::empty()
    }
}
