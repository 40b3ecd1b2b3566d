//! `dataflex wallet`: an agent's dashboard view.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::context::AppContext;
use crate::cli::id_resolver::resolve_agent_id;
use crate::cli::output::{cedis, output, CommandOutput};
use crate::cli::table::TableFormatter;
use crate::domain::models::{AgentDashboard, BalanceSource, Config};

#[derive(Args, Debug)]
pub struct WalletArgs {
    /// Agent ID prefix or phone number
    pub agent: String,
}

#[derive(Debug, Serialize)]
pub struct WalletOutput {
    #[serde(flatten)]
    pub dashboard: AgentDashboard,
}

impl CommandOutput for WalletOutput {
    fn to_human(&self) -> String {
        let d = &self.dashboard;
        let w = &d.wallet;
        let mut lines = vec![
            format!("Wallet for {} ({})", d.agent.name, d.agent.phone),
            format!("  Total earned:    {}", cedis(w.total_earned)),
            format!("  Pending:         {}", cedis(w.total_pending)),
            format!("  Withdrawn:       {}", cedis(w.total_withdrawn)),
            format!("  Available:       {}", cedis(w.available_balance)),
        ];

        match w.source {
            BalanceSource::Legacy => lines.push("  (from legacy totals)".to_string()),
            BalanceSource::Empty => lines.push("  (no commissions yet)".to_string()),
            BalanceSource::Records => {}
        }

        if w.has_anomalies() {
            lines.push(format!(
                "\n{} commission(s) had out-of-range amounts and were clamped:",
                w.anomalies.len()
            ));
            for anomaly in &w.anomalies {
                lines.push(format!("  {} -> {}: {}", anomaly.record_id, cedis(anomaly.clamped_amount), anomaly.reason));
            }
        }

        if let Some(at) = d.last_commission_at {
            lines.push(format!("\nLast commission: {}", at.format("%Y-%m-%d %H:%M")));
        }

        if !d.recent_commissions.is_empty() {
            lines.push("\nRecent commissions:".to_string());
            lines.push(TableFormatter::new().format_commissions(&d.recent_commissions));
        }

        lines.join("\n")
    }
}

pub async fn execute(args: WalletArgs, config: &Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open(config).await?;
    let agent_id = resolve_agent_id(&ctx.pool, &args.agent).await?;
    let dashboard = ctx.dashboard.agent_dashboard(agent_id).await?;
    output(&WalletOutput { dashboard }, json_mode);
    Ok(())
}
