//! Commission records earned by agents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Upper bound on a single commission record, in currency units.
pub const COMMISSION_CAP: f64 = 0.4;

/// Lowest value an out-of-range amount is clamped to when read back.
pub const CLAMP_FLOOR: f64 = 0.01;

/// Event that produced a commission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Referral,
    DataOrder,
    WholesaleOrder,
}

impl SourceType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Referral => "referral",
            Self::DataOrder => "data_order",
            Self::WholesaleOrder => "wholesale_order",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "referral" => Some(Self::Referral),
            "data_order" => Some(Self::DataOrder),
            "wholesale_order" => Some(Self::WholesaleOrder),
            _ => None,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s).ok_or_else(|| anyhow::anyhow!("Invalid commission source: {s}"))
    }
}

/// Lifecycle status of a commission record.
///
/// `Pending` commissions await confirmation of the underlying event and do
/// not count as earned. Records move `pending -> earned -> pending_withdrawal
/// -> withdrawn`, and a rejected withdrawal returns them to `earned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    Pending,
    Earned,
    PendingWithdrawal,
    Withdrawn,
}

impl CommissionStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Earned => "earned",
            Self::PendingWithdrawal => "pending_withdrawal",
            Self::Withdrawn => "withdrawn",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "earned" => Some(Self::Earned),
            "pending_withdrawal" => Some(Self::PendingWithdrawal),
            "withdrawn" => Some(Self::Withdrawn),
            _ => None,
        }
    }

    /// Whether the status counts towards the agent's lifetime earnings.
    pub const fn counts_as_earned(&self) -> bool {
        matches!(
            self,
            Self::Earned | Self::PendingWithdrawal | Self::Withdrawn
        )
    }

    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Earned)
                | (Self::Earned, Self::PendingWithdrawal)
                | (Self::PendingWithdrawal, Self::Withdrawn)
                | (Self::PendingWithdrawal, Self::Earned)
        )
    }
}

impl fmt::Display for CommissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommissionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s).ok_or_else(|| anyhow::anyhow!("Invalid commission status: {s}"))
    }
}

/// A single commission credited to an agent.
///
/// `amount` is optional because rows in the store predate the amount
/// constraint and may hold NULL. Newly created records always carry a value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionRecord {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub source_type: SourceType,
    /// Identifier of the order or referral that produced the commission
    pub source_id: String,
    pub amount: Option<f64>,
    pub status: CommissionStatus,
    /// Withdrawal request currently holding this record, if any
    pub withdrawal_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommissionRecord {
    pub fn new(
        agent_id: Uuid,
        source_type: SourceType,
        source_id: impl Into<String>,
        amount: f64,
        status: CommissionStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            agent_id,
            source_type,
            source_id: source_id.into(),
            amount: Some(amount),
            status,
            withdrawal_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `next`, rejecting transitions outside the lifecycle.
    pub fn transition_to(&mut self, next: CommissionStatus) -> Result<(), String> {
        if !self.status.can_transition_to(next) {
            return Err(format!(
                "commission {} cannot move from {} to {}",
                self.id, self.status, next
            ));
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}
