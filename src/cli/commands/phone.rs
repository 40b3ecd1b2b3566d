//! `dataflex phone`: normalise a number and detect its network.

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{normalize_phone, MobileNetwork};

#[derive(Args, Debug)]
pub struct PhoneArgs {
    /// Phone number in any accepted Ghana format
    #[arg(allow_hyphen_values = true)]
    pub number: String,
}

#[derive(Debug, Serialize)]
pub struct PhoneOutput {
    pub input: String,
    pub normalized: String,
    pub network: Option<MobileNetwork>,
}

impl CommandOutput for PhoneOutput {
    fn to_human(&self) -> String {
        let network = self
            .network
            .map_or_else(|| "unknown network".to_string(), |n| n.to_string());
        format!("{} ({network})", self.normalized)
    }
}

fn inspect(number: &str) -> Result<PhoneOutput> {
    let Some(normalized) = normalize_phone(number) else {
        bail!("'{number}' is not a valid Ghana phone number");
    };
    Ok(PhoneOutput {
        input: number.to_string(),
        network: MobileNetwork::detect(&normalized),
        normalized,
    })
}

pub fn execute(args: PhoneArgs, json_mode: bool) -> Result<()> {
    let out = inspect(&args.number)?;
    output(&out, json_mode);
    Ok(())
}
