//! `dataflex dashboard`: the admin overview of every agent's wallet.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::context::AppContext;
use crate::cli::output::{cedis, output, CommandOutput};
use crate::cli::table::TableFormatter;
use crate::domain::models::{AdminDashboard, Config};

#[derive(Args, Debug)]
pub struct DashboardArgs {
    /// Agents per page (1-500)
    #[arg(short, long, default_value = "100")]
    pub limit: u32,

    #[arg(long, default_value = "0")]
    pub offset: u32,
}

#[derive(Debug, Serialize)]
pub struct DashboardOutput {
    #[serde(flatten)]
    pub dashboard: AdminDashboard,
}

impl CommandOutput for DashboardOutput {
    fn to_human(&self) -> String {
        let d = &self.dashboard;
        if d.rows.is_empty() {
            return format!("No agents on this page ({} registered).", d.total_agents);
        }

        let available: f64 = d.rows.iter().map(|r| r.wallet.available_balance).sum();
        let flagged = d.rows.iter().filter(|r| r.wallet.has_anomalies()).count();

        let mut lines = vec![
            format!(
                "Agents {}-{} of {}",
                d.offset + 1,
                u64::from(d.offset) + d.rows.len() as u64,
                d.total_agents
            ),
            TableFormatter::new().format_admin_rows(&d.rows),
            format!("Available on this page: {}", cedis(available)),
        ];
        if flagged > 0 {
            lines.push(format!("{flagged} wallet(s) marked ! contain clamped commission amounts"));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: DashboardArgs, config: &Config, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open(config).await?;
    let dashboard = ctx.dashboard.admin_dashboard(args.limit, args.offset).await?;
    output(&DashboardOutput { dashboard }, json_mode);
    Ok(())
}
