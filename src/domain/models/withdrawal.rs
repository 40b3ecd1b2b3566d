use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Withdrawal request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    Pending,
    Processing,
    Paid,
    Rejected,
}

impl WithdrawalStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Paid => "paid",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "paid" => Some(Self::Paid),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Requests that still hold money back from the agent's balance.
    pub const fn is_in_flight(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Rejected)
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a withdrawal is paid from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalSource {
    /// Earned commission records, reserved while the request is open.
    #[default]
    Records,
    /// The legacy aggregate; paying it raises the legacy paid-out total.
    Legacy,
}

impl WithdrawalSource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Records => "records",
            Self::Legacy => "legacy",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "records" => Some(Self::Records),
            "legacy" => Some(Self::Legacy),
            _ => None,
        }
    }
}

impl fmt::Display for WithdrawalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An agent's request to cash out available commission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub amount: f64,
    pub source: WithdrawalSource,
    pub status: WithdrawalStatus,
    pub requested_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl WithdrawalRequest {
    pub fn new(id: Uuid, agent_id: Uuid, amount: f64) -> Self {
        Self {
            id,
            agent_id,
            amount,
            source: WithdrawalSource::Records,
            status: WithdrawalStatus::Pending,
            requested_at: Utc::now(),
            resolved_at: None,
        }
    }

    pub fn with_source(mut self, source: WithdrawalSource) -> Self {
        self.source = source;
        self
    }

    pub const fn is_in_flight(&self) -> bool {
        self.status.is_in_flight()
    }

    /// Mark a pending request as being paid out.
    pub fn begin_processing(&mut self) -> Result<(), String> {
        if self.status != WithdrawalStatus::Pending {
            return Err(format!("withdrawal {} is {}, not pending", self.id, self.status));
        }
        self.status = WithdrawalStatus::Processing;
        Ok(())
    }

    /// Move to a terminal status.
    pub fn resolve(&mut self, status: WithdrawalStatus) -> Result<(), String> {
        if self.status.is_terminal() {
            return Err(format!("withdrawal {} is already {}", self.id, self.status));
        }
        if !status.is_terminal() {
            return Err(format!("{status} is not a terminal withdrawal status"));
        }
        self.status = status;
        self.resolved_at = Some(Utc::now());
        Ok(())
    }
}
