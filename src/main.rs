//! DataFlex CLI entry point.

use clap::Parser;

use dataflex::cli::{commands, handle_error, Cli, Commands};
use dataflex::infrastructure::config::ConfigLoader;
use dataflex::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ConfigLoader::load() {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    // Held for the life of the process so buffered file logs get flushed.
    let _logger = match LoggerImpl::init(&LogConfig::from_settings(&config.logging)) {
        Ok(logger) => Some(logger),
        Err(err) => {
            eprintln!("Warning: logging disabled: {err:#}");
            None
        }
    };

    let result = match cli.command {
        Commands::Init(args) => commands::init::execute(args, cli.json).await,
        Commands::Agent(args) => commands::agent::execute(args, &config, cli.json).await,
        Commands::Commission(args) => commands::commission::execute(args, &config, cli.json).await,
        Commands::Wallet(args) => commands::wallet::execute(args, &config, cli.json).await,
        Commands::Withdraw(args) => commands::withdraw::execute(args, &config, cli.json).await,
        Commands::Dashboard(args) => commands::dashboard::execute(args, &config, cli.json).await,
        Commands::Phone(args) => commands::phone::execute(args, cli.json),
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
