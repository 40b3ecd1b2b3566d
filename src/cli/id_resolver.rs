//! Short ID prefix resolution for CLI commands.
//!
//! Allows users to specify any unique prefix of a UUID instead of the full
//! ID, similar to git short hashes. Agents can also be named by phone number.

use anyhow::{bail, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::models::normalize_phone;

const AGENT_QUERY: &str = "SELECT id FROM agents WHERE id LIKE ?";
const COMMISSION_QUERY: &str = "SELECT id FROM commissions WHERE id LIKE ?";
const WITHDRAWAL_QUERY: &str = "SELECT id FROM withdrawals WHERE id LIKE ?";

/// Resolve an agent by ID prefix or by phone number in any accepted format.
pub async fn resolve_agent_id(pool: &SqlitePool, reference: &str) -> Result<Uuid> {
    if let Some(phone) = normalize_phone(reference) {
        let row: Option<(String,)> = sqlx::query_as("SELECT id FROM agents WHERE phone = ?")
            .bind(&phone)
            .fetch_optional(pool)
            .await?;
        if let Some((id,)) = row {
            return Ok(Uuid::parse_str(&id)?);
        }
    }

    resolve_prefix(pool, reference, "agent", AGENT_QUERY).await
}

pub async fn resolve_commission_id(pool: &SqlitePool, prefix: &str) -> Result<Uuid> {
    resolve_prefix(pool, prefix, "commission", COMMISSION_QUERY).await
}

pub async fn resolve_withdrawal_id(pool: &SqlitePool, prefix: &str) -> Result<Uuid> {
    resolve_prefix(pool, prefix, "withdrawal", WITHDRAWAL_QUERY).await
}

fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        bail!("ID prefix must not be empty");
    }
    if !prefix.chars().all(|c| c.is_ascii_hexdigit() || c == '-') {
        bail!("Invalid ID prefix '{prefix}': must contain only hex characters and dashes");
    }
    Ok(())
}

async fn resolve_prefix(pool: &SqlitePool, prefix: &str, entity: &str, query: &str) -> Result<Uuid> {
    if let Ok(uuid) = Uuid::parse_str(prefix) {
        return Ok(uuid);
    }

    validate_prefix(prefix)?;

    let pattern = format!("{}%", prefix.to_lowercase());
    let rows: Vec<(String,)> = sqlx::query_as(query).bind(&pattern).fetch_all(pool).await?;

    match rows.as_slice() {
        [] => bail!("No {entity} found matching '{prefix}'"),
        [(id,)] => Ok(Uuid::parse_str(id)?),
        _ => {
            let mut msg = format!("Ambiguous prefix '{prefix}': matches {} {entity}s:", rows.len());
            for (id,) in &rows {
                msg.push_str(&format!("\n  {id}"));
            }
            bail!("{msg}")
        }
    }
}
