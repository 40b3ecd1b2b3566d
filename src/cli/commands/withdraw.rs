//! Withdrawal CLI commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::cli::context::AppContext;
use crate::cli::id_resolver::{resolve_agent_id, resolve_withdrawal_id};
use crate::cli::output::{cedis, output, CommandOutput};
use crate::cli::table::TableFormatter;
use crate::domain::models::{Config, WithdrawalRequest};

#[derive(Args, Debug)]
pub struct WithdrawArgs {
    #[command(subcommand)]
    pub command: WithdrawCommands,
}

#[derive(Subcommand, Debug)]
pub enum WithdrawCommands {
    /// Request a withdrawal of an agent's available balance
    Request {
        /// Agent ID prefix or phone number
        agent: String,
    },
    /// List an agent's withdrawals
    List {
        /// Agent ID prefix or phone number
        agent: String,
    },
    /// Mark a pending withdrawal as processing
    Process {
        /// Withdrawal ID prefix
        id: String,
    },
    /// Mark a withdrawal as paid
    Complete {
        /// Withdrawal ID prefix
        id: String,
    },
    /// Reject a withdrawal and release its commissions
    Reject {
        /// Withdrawal ID prefix
        id: String,
    },
}

#[derive(Debug, Serialize)]
pub struct WithdrawalOutput {
    #[serde(flatten)]
    pub request: WithdrawalRequest,
}

impl CommandOutput for WithdrawalOutput {
    fn to_human(&self) -> String {
        let r = &self.request;
        format!(
            "Withdrawal {}\n  Agent: {}\n  Amount: {} ({})\n  Status: {}",
            r.id,
            r.agent_id,
            cedis(r.amount),
            r.source,
            r.status
        )
    }
}

#[derive(Debug, Serialize)]
pub struct WithdrawalListOutput {
    pub withdrawals: Vec<WithdrawalRequest>,
    pub total: usize,
}

impl CommandOutput for WithdrawalListOutput {
    fn to_human(&self) -> String {
        if self.withdrawals.is_empty() {
            return "No withdrawals found.".to_string();
        }
        format!(
            "Found {} withdrawal(s):\n{}",
            self.total,
            TableFormatter::new().format_withdrawals(&self.withdrawals)
        )
    }
}

pub async fn execute(args: WithdrawArgs, config: &Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open(config).await?;

    let request = match args.command {
        WithdrawCommands::Request { agent } => {
            let agent_id = resolve_agent_id(&ctx.pool, &agent).await?;
            ctx.wallet.request_withdrawal(agent_id).await?
        }
        WithdrawCommands::List { agent } => {
            let agent_id = resolve_agent_id(&ctx.pool, &agent).await?;
            let withdrawals = ctx.wallet.list_withdrawals(agent_id).await?;
            let total = withdrawals.len();
            output(&WithdrawalListOutput { withdrawals, total }, json_mode);
            return Ok(());
        }
        WithdrawCommands::Process { id } => {
            let id = resolve_withdrawal_id(&ctx.pool, &id).await?;
            ctx.wallet.process_withdrawal(id).await?
        }
        WithdrawCommands::Complete { id } => {
            let id = resolve_withdrawal_id(&ctx.pool, &id).await?;
            ctx.wallet.complete_withdrawal(id).await?
        }
        WithdrawCommands::Reject { id } => {
            let id = resolve_withdrawal_id(&ctx.pool, &id).await?;
            ctx.wallet.reject_withdrawal(id).await?
        }
    };

    output(&WithdrawalOutput { request }, json_mode);
    Ok(())
}
