use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::network::{normalize_phone, MobileNetwork};

/// Aggregate totals carried on agent accounts created before per-record
/// commission tracking existed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyAggregate {
    pub total_commissions: Option<f64>,
    pub total_paid_out: Option<f64>,
}

impl LegacyAggregate {
    pub const fn new(total_commissions: f64, total_paid_out: f64) -> Self {
        Self {
            total_commissions: Some(total_commissions),
            total_paid_out: Some(total_paid_out),
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.total_commissions.is_none() && self.total_paid_out.is_none()
    }
}

/// Reseller account that sells data bundles and earns commission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: Uuid,
    pub name: String,

    /// Phone number in local `0XXXXXXXXX` form
    pub phone: String,

    /// Network detected from the phone prefix
    pub network: Option<MobileNetwork>,

    pub legacy: LegacyAggregate,
    pub created_at: DateTime<Utc>,
}

impl Agent {
    /// Build an agent from raw input, normalising the phone number.
    pub fn new(name: impl Into<String>, phone: &str) -> Result<Self, String> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("agent name cannot be empty".to_string());
        }
        let phone = normalize_phone(phone)
            .ok_or_else(|| format!("invalid Ghana phone number: {phone}"))?;

        Ok(Self {
            id: Uuid::new_v4(),
            network: MobileNetwork::detect(&phone),
            name,
            phone,
            legacy: LegacyAggregate::default(),
            created_at: Utc::now(),
        })
    }

    #[must_use]
    pub const fn with_legacy(mut self, legacy: LegacyAggregate) -> Self {
        self.legacy = legacy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_agent_normalises_phone() {
        let agent = Agent::new("Ama", "+233 55 000 1111").unwrap();
        assert_eq!(agent.phone, "0550001111");
        assert_eq!(agent.network, Some(MobileNetwork::Mtn));
        assert!(agent.legacy.is_empty());
    }

    #[test]
    fn test_new_agent_rejects_bad_input() {
        assert!(Agent::new("", "0241234567").is_err());
        assert!(Agent::new("Kofi", "12345").is_err());
    }
}
