//! Agent CLI commands.

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::cli::context::AppContext;
use crate::cli::id_resolver::resolve_agent_id;
use crate::cli::output::{cedis, output, CommandOutput};
use crate::cli::table::TableFormatter;
use crate::domain::models::{Agent, Config, LegacyAggregate, MobileNetwork, WalletSummary};
use crate::domain::ports::AgentFilter;

#[derive(Args, Debug)]
pub struct AgentArgs {
    #[command(subcommand)]
    pub command: AgentCommands,
}

#[derive(Subcommand, Debug)]
pub enum AgentCommands {
    /// Register a new agent
    Add {
        /// Agent display name
        name: String,
        /// Phone number (0XXXXXXXXX, 233XXXXXXXXX or +233 XX XXX XXXX)
        phone: String,
        /// Commission total carried over from before per-record tracking
        #[arg(long)]
        legacy_commissions: Option<f64>,
        /// Amount already paid out against the legacy total
        #[arg(long)]
        legacy_paid_out: Option<f64>,
    },
    /// List agents
    List {
        /// Filter by network (mtn, telecel, airteltigo)
        #[arg(short, long)]
        network: Option<String>,
        /// Filter by name (substring match)
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long, default_value = "50")]
        limit: u32,
        #[arg(long, default_value = "0")]
        offset: u32,
    },
    /// Show an agent and their wallet
    Show {
        /// Agent ID prefix or phone number
        agent: String,
    },
}

#[derive(Debug, Serialize)]
pub struct AgentOutput {
    #[serde(flatten)]
    pub agent: Agent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet: Option<WalletSummary>,
}

impl CommandOutput for AgentOutput {
    fn to_human(&self) -> String {
        let agent = &self.agent;
        let mut lines = vec![
            format!("Agent: {}", agent.name),
            format!("ID: {}", agent.id),
            format!("Phone: {}", agent.phone),
            format!(
                "Network: {}",
                agent.network.map_or_else(|| "unknown".to_string(), |n| n.to_string())
            ),
            format!("Registered: {}", agent.created_at.format("%Y-%m-%d %H:%M")),
        ];

        if !agent.legacy.is_empty() {
            lines.push(format!(
                "Legacy: {} earned, {} paid out",
                cedis(agent.legacy.total_commissions.unwrap_or(0.0)),
                cedis(agent.legacy.total_paid_out.unwrap_or(0.0)),
            ));
        }

        if let Some(wallet) = &self.wallet {
            lines.push(format!("Available: {}", cedis(wallet.available_balance)));
        }

        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct AgentListOutput {
    pub agents: Vec<Agent>,
    pub total: usize,
}

impl CommandOutput for AgentListOutput {
    fn to_human(&self) -> String {
        if self.agents.is_empty() {
            return "No agents found.".to_string();
        }
        format!(
            "Found {} agent(s):\n{}",
            self.total,
            TableFormatter::new().format_agents(&self.agents)
        )
    }
}

fn legacy_from_args(commissions: Option<f64>, paid_out: Option<f64>) -> Option<LegacyAggregate> {
    let legacy = LegacyAggregate {
        total_commissions: commissions,
        total_paid_out: paid_out,
    };
    (!legacy.is_empty()).then_some(legacy)
}

pub async fn execute(args: AgentArgs, config: &Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open(config).await?;

    match args.command {
        AgentCommands::Add {
            name,
            phone,
            legacy_commissions,
            legacy_paid_out,
        } => {
            let legacy = legacy_from_args(legacy_commissions, legacy_paid_out);
            let agent = ctx.wallet.register_agent(&name, &phone, legacy).await?;
            output(&AgentOutput { agent, wallet: None }, json_mode);
        }

        AgentCommands::List {
            network,
            name,
            limit,
            offset,
        } => {
            let network = network
                .map(|n| MobileNetwork::parse_str(&n).ok_or_else(|| anyhow!("Invalid network: {n}")))
                .transpose()?;
            let agents = ctx
                .wallet
                .list_agents(AgentFilter {
                    network,
                    name_pattern: name.map(|n| format!("*{n}*")),
                    limit: Some(limit),
                    offset: Some(offset),
                })
                .await?;
            let total = agents.len();
            output(&AgentListOutput { agents, total }, json_mode);
        }

        AgentCommands::Show { agent } => {
            let id = resolve_agent_id(&ctx.pool, &agent).await?;
            let agent = ctx.wallet.get_agent(id).await?;
            let wallet = ctx.wallet.wallet_summary(id).await?;
            output(
                &AgentOutput {
                    agent,
                    wallet: Some(wallet),
                },
                json_mode,
            );
        }
    }

    Ok(())
}
