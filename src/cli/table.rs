//! Table output formatting for CLI commands
//!
//! Renders agents, commissions, withdrawals and admin dashboard pages with
//! comfy-table. Colors are dropped when `NO_COLOR` is set or the terminal is
//! dumb.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

use crate::cli::output::{cedis, short_id, truncate};
use crate::domain::models::{
    AdminDashboardRow, Agent, CommissionRecord, CommissionStatus, WithdrawalRequest,
    WithdrawalStatus,
};
use crate::services::ledger::effective_amount;

/// Table formatter for CLI output
pub struct TableFormatter {
    use_colors: bool,
    max_width: Option<u16>,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    pub const fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    pub fn format_agents(&self, agents: &[Agent]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["ID", "Name", "Phone", "Network", "Registered"]));

        for agent in agents {
            table.add_row(vec![
                Cell::new(short_id(&agent.id)),
                Cell::new(truncate(&agent.name, 30)),
                Cell::new(&agent.phone),
                Cell::new(agent.network.map_or_else(|| "-".to_string(), |n| n.to_string())),
                Cell::new(agent.created_at.format("%Y-%m-%d").to_string()),
            ]);
        }

        table.to_string()
    }

    pub fn format_commissions(&self, records: &[CommissionRecord]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["ID", "Source", "Reference", "Amount", "Status", "Created"]));

        for record in records {
            let amount = match record.amount {
                Some(raw) if (raw - effective_amount(record)).abs() < f64::EPSILON => cedis(raw),
                _ => format!("{} (clamped)", cedis(effective_amount(record))),
            };
            let status = if self.use_colors {
                Cell::new(record.status).fg(commission_color(record.status))
            } else {
                Cell::new(record.status)
            };

            table.add_row(vec![
                Cell::new(short_id(&record.id)),
                Cell::new(record.source_type),
                Cell::new(truncate(&record.source_id, 24)),
                Cell::new(amount),
                status,
                Cell::new(record.created_at.format("%Y-%m-%d %H:%M").to_string()),
            ]);
        }

        table.to_string()
    }

    pub fn format_withdrawals(&self, requests: &[WithdrawalRequest]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["ID", "Amount", "Source", "Status", "Requested", "Resolved"]));

        for request in requests {
            let status = if self.use_colors {
                Cell::new(request.status).fg(withdrawal_color(request.status))
            } else {
                Cell::new(request.status)
            };

            table.add_row(vec![
                Cell::new(short_id(&request.id)),
                Cell::new(cedis(request.amount)),
                Cell::new(request.source),
                status,
                Cell::new(request.requested_at.format("%Y-%m-%d %H:%M").to_string()),
                Cell::new(
                    request
                        .resolved_at
                        .map_or_else(|| "-".to_string(), |at| at.format("%Y-%m-%d %H:%M").to_string()),
                ),
            ]);
        }

        table.to_string()
    }

    pub fn format_admin_rows(&self, rows: &[AdminDashboardRow]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&[
            "ID", "Name", "Phone", "Earned", "Pending", "Withdrawn", "Available", "Source", "Last commission",
        ]));

        for row in rows {
            let available = Cell::new(cedis(row.wallet.available_balance));
            let available = if self.use_colors && row.wallet.available_balance > 0.0 {
                available.fg(Color::Green)
            } else {
                available
            };
            let source = if row.wallet.has_anomalies() {
                format!("{} !", row.wallet.source.as_str())
            } else {
                row.wallet.source.as_str().to_string()
            };

            table.add_row(vec![
                Cell::new(short_id(&row.agent_id)),
                Cell::new(truncate(&row.name, 24)),
                Cell::new(&row.phone),
                Cell::new(cedis(row.wallet.total_earned)),
                Cell::new(cedis(row.wallet.total_pending)),
                Cell::new(cedis(row.wallet.total_withdrawn)),
                available,
                Cell::new(source),
                Cell::new(
                    row.last_commission_at
                        .map_or_else(|| "never".to_string(), |at| at.format("%Y-%m-%d").to_string()),
                ),
            ]);
        }

        table.to_string()
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|title| Cell::new(title).add_attribute(Attribute::Bold))
        .collect()
}

fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    !matches!(env::var("TERM").as_deref(), Ok("dumb"))
}

const fn commission_color(status: CommissionStatus) -> Color {
    match status {
        CommissionStatus::Pending => Color::Yellow,
        CommissionStatus::Earned => Color::Green,
        CommissionStatus::PendingWithdrawal => Color::Cyan,
        CommissionStatus::Withdrawn => Color::DarkGrey,
    }
}

const fn withdrawal_color(status: WithdrawalStatus) -> Color {
    match status {
        WithdrawalStatus::Pending => Color::Yellow,
        WithdrawalStatus::Processing => Color::Cyan,
        WithdrawalStatus::Paid => Color::Green,
        WithdrawalStatus::Rejected => Color::Red,
    }
}
