//! Commission constraint checks and wallet aggregation.
//!
//! Aggregation never fails. Amounts that break the per-record cap are
//! logged, clamped into range and reported as anomalies so a dashboard
//! always renders, while the corruption stays visible to whoever reads the
//! summary.

use serde::Serialize;
use tracing::warn;

use crate::domain::models::{
    BalanceSource, CommissionAnomaly, CommissionRecord, CommissionStatus, LegacyAggregate,
    WalletSummary, WithdrawalRequest, CLAMP_FLOOR, COMMISSION_CAP,
};

/// Outcome of validating a single commission amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstraintCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConstraintCheck {
    const fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    fn fail(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
        }
    }
}

/// Check an amount against the commission bounds `0 <= amount <= 0.4`.
pub fn meets_constraints(amount: impl Into<Option<f64>>) -> ConstraintCheck {
    match amount.into() {
        None => ConstraintCheck::fail("commission amount is missing"),
        Some(a) if a.is_nan() => ConstraintCheck::fail("commission amount is not a number"),
        Some(a) if a < 0.0 => ConstraintCheck::fail(format!("commission amount {a} is negative")),
        Some(a) if a > COMMISSION_CAP => ConstraintCheck::fail(format!(
            "commission amount {a} exceeds the cap of {COMMISSION_CAP}"
        )),
        Some(_) => ConstraintCheck::ok(),
    }
}

/// Force an amount into range. Valid amounts pass through untouched.
///
/// Missing, NaN and negative amounts become [`CLAMP_FLOOR`]; anything above
/// the cap becomes [`COMMISSION_CAP`].
pub fn clamp_amount(amount: impl Into<Option<f64>>) -> f64 {
    match amount.into() {
        Some(a) if a > COMMISSION_CAP => COMMISSION_CAP,
        Some(a) if (0.0..=COMMISSION_CAP).contains(&a) => a,
        _ => CLAMP_FLOOR,
    }
}

/// Amount a record contributes to any sum, after clamping.
pub fn effective_amount(record: &CommissionRecord) -> f64 {
    clamp_amount(record.amount)
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Aggregate an agent's commission records into wallet totals.
///
/// When the records add up to nothing, the legacy aggregate stands in:
/// earned is the legacy commission total, withdrawn is the legacy paid-out
/// total, and the available balance is what remains after subtracting
/// in-flight withdrawals, floored at zero.
pub fn summarize(
    records: &[CommissionRecord],
    legacy: Option<&LegacyAggregate>,
    in_flight: &[WithdrawalRequest],
) -> WalletSummary {
    let mut summary = WalletSummary {
        source: BalanceSource::Records,
        ..WalletSummary::empty()
    };
    let mut total = 0.0;

    for record in records {
        let check = meets_constraints(record.amount);
        let amount = clamp_amount(record.amount);

        if let Some(reason) = check.error {
            warn!(
                record_id = %record.id,
                agent_id = %record.agent_id,
                original = ?record.amount,
                clamped = amount,
                %reason,
                "commission amount out of bounds, clamping"
            );
            summary.anomalies.push(CommissionAnomaly {
                record_id: record.id,
                original_amount: record.amount,
                clamped_amount: amount,
                reason,
            });
        }

        total += amount;
        if record.status.counts_as_earned() {
            summary.total_earned += amount;
        }
        match record.status {
            CommissionStatus::Pending => summary.total_pending += amount,
            CommissionStatus::Withdrawn => summary.total_withdrawn += amount,
            CommissionStatus::Earned => summary.available_balance += amount,
            CommissionStatus::PendingWithdrawal => {}
        }
    }

    if total > 0.0 {
        return summary;
    }

    match legacy.filter(|l| !l.is_empty()) {
        Some(legacy) => {
            let total_commissions = finite_or_zero(legacy.total_commissions);
            let total_paid_out = finite_or_zero(legacy.total_paid_out);
            let reserved: f64 = in_flight
                .iter()
                .filter(|w| w.is_in_flight())
                .map(|w| finite_or_zero(Some(w.amount)))
                .sum();

            WalletSummary {
                total_earned: total_commissions,
                total_pending: 0.0,
                total_withdrawn: total_paid_out,
                available_balance: (total_commissions - total_paid_out - reserved).max(0.0),
                source: BalanceSource::Legacy,
                anomalies: summary.anomalies,
            }
        }
        None if records.is_empty() => WalletSummary::empty(),
        None => summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{SourceType, WithdrawalStatus};
    use uuid::Uuid;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn rec(amount: Option<f64>, status: CommissionStatus) -> CommissionRecord {
        let mut r = CommissionRecord::new(Uuid::nil(), SourceType::DataOrder, "order", 0.0, status);
        r.amount = amount;
        r
    }

    #[test]
    fn test_constraint_bounds() {
        assert!(meets_constraints(0.4).valid);
        assert!(meets_constraints(0.0).valid);
        assert!(!meets_constraints(0.41).valid);
        assert!(!meets_constraints(-0.01).valid);
        assert!(!meets_constraints(f64::NAN).valid);
        assert!(!meets_constraints(None).valid);
        assert!(!meets_constraints(f64::INFINITY).valid);
        assert!(meets_constraints(0.41).error.unwrap().contains("exceeds"));
    }

    #[test]
    fn test_clamp_amount() {
        assert!(close(clamp_amount(0.25), 0.25));
        assert!(close(clamp_amount(0.0), 0.0));
        assert!(close(clamp_amount(5.0), COMMISSION_CAP));
        assert!(close(clamp_amount(-3.0), CLAMP_FLOOR));
        assert!(close(clamp_amount(f64::NAN), CLAMP_FLOOR));
        assert!(close(clamp_amount(None), CLAMP_FLOOR));
    }

    #[test]
    fn test_summarize_by_status() {
        let records = vec![
            rec(Some(0.3), CommissionStatus::Earned),
            rec(Some(0.2), CommissionStatus::Pending),
            rec(Some(0.1), CommissionStatus::Withdrawn),
        ];

        let summary = summarize(&records, None, &[]);
        assert!(close(summary.total_earned, 0.4));
        assert!(close(summary.total_pending, 0.2));
        assert!(close(summary.total_withdrawn, 0.1));
        assert!(close(summary.available_balance, 0.3));
        assert_eq!(summary.source, BalanceSource::Records);
        assert!(!summary.has_anomalies());
    }

    #[test]
    fn test_reserved_counts_as_earned_but_not_available() {
        let records = vec![
            rec(Some(0.2), CommissionStatus::PendingWithdrawal),
            rec(Some(0.1), CommissionStatus::Earned),
        ];
        let summary = summarize(&records, None, &[]);
        assert!(close(summary.total_earned, 0.3));
        assert!(close(summary.available_balance, 0.1));
    }

    #[test]
    fn test_invalid_amounts_are_clamped_and_reported() {
        let records = vec![
            rec(Some(2.5), CommissionStatus::Earned),
            rec(Some(f64::NAN), CommissionStatus::Earned),
            rec(None, CommissionStatus::Pending),
        ];

        let summary = summarize(&records, None, &[]);
        assert!(close(summary.available_balance, 0.41));
        assert!(close(summary.total_pending, 0.01));
        assert_eq!(summary.anomalies.len(), 3);
        assert_eq!(summary.anomalies[0].original_amount, Some(2.5));
        assert!(close(summary.anomalies[0].clamped_amount, 0.4));
    }

    #[test]
    fn test_legacy_fallback_subtracts_in_flight() {
        let legacy = LegacyAggregate::new(10.0, 4.0);
        let open = WithdrawalRequest::new(Uuid::new_v4(), Uuid::nil(), 1.0);
        let mut paid = WithdrawalRequest::new(Uuid::new_v4(), Uuid::nil(), 3.0);
        paid.resolve(WithdrawalStatus::Paid).unwrap();

        let summary = summarize(&[], Some(&legacy), &[open, paid]);
        assert!(close(summary.available_balance, 5.0));
        assert!(close(summary.total_earned, 10.0));
        assert!(close(summary.total_withdrawn, 4.0));
        assert_eq!(summary.source, BalanceSource::Legacy);
    }

    #[test]
    fn test_legacy_fallback_floors_at_zero() {
        let legacy = LegacyAggregate::new(2.0, 1.5);
        let open = WithdrawalRequest::new(Uuid::new_v4(), Uuid::nil(), 1.0);
        let summary = summarize(&[], Some(&legacy), &[open]);
        assert!(close(summary.available_balance, 0.0));
    }

    #[test]
    fn test_legacy_ignored_when_records_have_value() {
        let legacy = LegacyAggregate::new(10.0, 0.0);
        let records = vec![rec(Some(0.2), CommissionStatus::Earned)];
        let summary = summarize(&records, Some(&legacy), &[]);
        assert_eq!(summary.source, BalanceSource::Records);
        assert!(close(summary.available_balance, 0.2));
    }

    #[test]
    fn test_zero_valued_records_fall_back_to_legacy() {
        let legacy = LegacyAggregate {
            total_commissions: Some(3.0),
            total_paid_out: None,
        };
        let records = vec![rec(Some(0.0), CommissionStatus::Earned)];
        let summary = summarize(&records, Some(&legacy), &[]);
        assert_eq!(summary.source, BalanceSource::Legacy);
        assert!(close(summary.available_balance, 3.0));
    }

    #[test]
    fn test_nothing_to_summarize() {
        let summary = summarize(&[], None, &[]);
        assert_eq!(summary, WalletSummary::empty());

        let blank = LegacyAggregate::default();
        assert_eq!(summarize(&[], Some(&blank), &[]).source, BalanceSource::Empty);
    }
}
