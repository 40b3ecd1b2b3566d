//! Commission CLI commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::cli::context::AppContext;
use crate::cli::id_resolver::{resolve_agent_id, resolve_commission_id};
use crate::cli::output::{cedis, output, CommandOutput};
use crate::cli::table::TableFormatter;
use crate::domain::models::{CommissionRecord, CommissionStatus, Config, SourceType, COMMISSION_CAP};
use crate::services::ledger::{clamp_amount, meets_constraints, ConstraintCheck};

#[derive(Args, Debug)]
pub struct CommissionArgs {
    #[command(subcommand)]
    pub command: CommissionCommands,
}

#[derive(Subcommand, Debug)]
pub enum CommissionCommands {
    /// Record a commission for an agent
    Record {
        /// Agent ID prefix or phone number
        agent: String,
        /// Commission source (referral, data_order, wholesale_order)
        #[arg(short, long, default_value = "data_order")]
        source_type: SourceType,
        /// Order or referral reference
        #[arg(long)]
        source_id: String,
        /// Amount in cedis
        #[arg(short, long)]
        amount: f64,
        /// Record as pending rather than earned
        #[arg(long)]
        pending: bool,
    },
    /// Confirm a pending commission
    Confirm {
        /// Commission ID prefix
        id: String,
    },
    /// List an agent's commissions
    List {
        /// Agent ID prefix or phone number
        agent: String,
    },
    /// Check an amount against the commission constraints
    Check {
        #[arg(allow_hyphen_values = true)]
        amount: f64,
    },
}

#[derive(Debug, Serialize)]
pub struct CommissionOutput {
    #[serde(flatten)]
    pub record: CommissionRecord,
}

impl CommandOutput for CommissionOutput {
    fn to_human(&self) -> String {
        let r = &self.record;
        format!(
            "Commission {}\n  Agent: {}\n  Source: {} {}\n  Amount: {}\n  Status: {}",
            r.id,
            r.agent_id,
            r.source_type,
            r.source_id,
            cedis(clamp_amount(r.amount)),
            r.status
        )
    }
}

#[derive(Debug, Serialize)]
pub struct CommissionListOutput {
    pub commissions: Vec<CommissionRecord>,
    pub total: usize,
}

impl CommandOutput for CommissionListOutput {
    fn to_human(&self) -> String {
        if self.commissions.is_empty() {
            return "No commissions found.".to_string();
        }
        format!(
            "Found {} commission(s):\n{}",
            self.total,
            TableFormatter::new().format_commissions(&self.commissions)
        )
    }
}

#[derive(Debug, Serialize)]
pub struct CheckOutput {
    pub amount: f64,
    #[serde(flatten)]
    pub check: ConstraintCheck,
    /// What aggregation would count this amount as
    pub clamped: f64,
}

impl CommandOutput for CheckOutput {
    fn to_human(&self) -> String {
        match &self.check.error {
            None => format!("{} is a valid commission (cap {})", self.amount, cedis(COMMISSION_CAP)),
            Some(error) => format!(
                "Invalid: {error}\nWould be counted as {} when aggregating",
                cedis(self.clamped)
            ),
        }
    }
}

pub async fn execute(args: CommissionArgs, config: &Config, json_mode: bool) -> Result<()> {
    match args.command {
        CommissionCommands::Record {
            agent,
            source_type,
            source_id,
            amount,
            pending,
        } => {
            let ctx = AppContext::open(config).await?;
            let agent_id = resolve_agent_id(&ctx.pool, &agent).await?;
            let status = if pending {
                CommissionStatus::Pending
            } else {
                CommissionStatus::Earned
            };
            let record = ctx
                .wallet
                .record_commission(agent_id, source_type, &source_id, amount, status)
                .await?;
            output(&CommissionOutput { record }, json_mode);
        }

        CommissionCommands::Confirm { id } => {
            let ctx = AppContext::open(config).await?;
            let id = resolve_commission_id(&ctx.pool, &id).await?;
            let record = ctx.wallet.confirm_commission(id).await?;
            output(&CommissionOutput { record }, json_mode);
        }

        CommissionCommands::List { agent } => {
            let ctx = AppContext::open(config).await?;
            let agent_id = resolve_agent_id(&ctx.pool, &agent).await?;
            let commissions = ctx.wallet.list_commissions(agent_id).await?;
            let total = commissions.len();
            output(&CommissionListOutput { commissions, total }, json_mode);
        }

        // Pure arithmetic; no database needed.
        CommissionCommands::Check { amount } => {
            let out = CheckOutput {
                amount,
                check: meets_constraints(amount),
                clamped: clamp_amount(amount),
            };
            output(&out, json_mode);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_output_messages() {
        let ok = CheckOutput {
            amount: 0.4,
            check: meets_constraints(0.4),
            clamped: clamp_amount(0.4),
        };
        assert!(ok.to_human().contains("valid commission"));

        let bad = CheckOutput {
            amount: 0.41,
            check: meets_constraints(0.41),
            clamped: clamp_amount(0.41),
        };
        let text = bad.to_human();
        assert!(text.starts_with("Invalid"));
        assert!(text.contains("GH₵ 0.40"));

        let json = bad.to_json();
        assert_eq!(json["valid"], false);
    }
}
