//! CLI type definitions
//!
//! Top-level clap structures. Each command's arguments live next to its
//! implementation under `commands`.

use clap::{Parser, Subcommand};

use super::commands::{
    agent::AgentArgs, commission::CommissionArgs, dashboard::DashboardArgs, init::InitArgs,
    phone::PhoneArgs, wallet::WalletArgs, withdraw::WithdrawArgs,
};

#[derive(Parser, Debug)]
#[command(name = "dataflex")]
#[command(about = "DataFlex - agent wallets and commission ledger", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize configuration and database in the current directory
    Init(InitArgs),

    /// Agent management commands
    Agent(AgentArgs),

    /// Commission recording and validation
    Commission(CommissionArgs),

    /// Show an agent's wallet
    Wallet(WalletArgs),

    /// Withdrawal requests
    Withdraw(WithdrawArgs),

    /// Admin dashboard of all agents
    Dashboard(DashboardArgs),

    /// Normalise a phone number and detect its network
    Phone(PhoneArgs),
}
