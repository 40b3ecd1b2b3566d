//! `dataflex` command-line interface.

pub mod commands;
pub mod context;
pub mod id_resolver;
pub mod output;
pub mod table;
pub mod types;

pub use context::AppContext;
pub use types::{Cli, Commands};

use crate::domain::errors::DomainError;

/// Print a failed command's error and exit non-zero.
///
/// Domain errors exit with 2 so scripts can tell a rejected request from an
/// infrastructure failure (exit 1).
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    let code = if err.downcast_ref::<DomainError>().is_some() { 2 } else { 1 };

    if json_mode {
        let body = serde_json::json!({
            "success": false,
            "error": err.to_string(),
            "causes": err.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err}");
        for cause in err.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
    }

    std::process::exit(code)
}
