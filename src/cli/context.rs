//! Wiring shared by every command that touches the ledger.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::adapters::cache::DashboardCache;
use crate::adapters::sqlite::{
    initialize_database, PoolConfig, SqliteAgentRepository, SqliteCommissionRepository,
    SqliteWithdrawalRepository,
};
use crate::domain::models::Config;
use crate::services::{DashboardService, RetryPolicy, WalletService};

pub type SqliteWalletService =
    WalletService<SqliteAgentRepository, SqliteCommissionRepository, SqliteWithdrawalRepository>;
pub type SqliteDashboardService =
    DashboardService<SqliteAgentRepository, SqliteCommissionRepository, SqliteWithdrawalRepository>;

/// Open database plus the services built on it. Both services share one
/// dashboard cache, so wallet mutations invalidate dashboard reads.
pub struct AppContext {
    pub pool: SqlitePool,
    pub cache: DashboardCache,
    pub wallet: SqliteWalletService,
    pub dashboard: SqliteDashboardService,
}

impl AppContext {
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = initialize_database(&config.database.url(), Some(PoolConfig::from(&config.database)))
            .await
            .with_context(|| {
                format!(
                    "Failed to open database at {}. Run 'dataflex init' first.",
                    config.database.path
                )
            })?;

        Ok(Self::from_pool(pool, config))
    }

    pub fn from_pool(pool: SqlitePool, config: &Config) -> Self {
        let agents = Arc::new(SqliteAgentRepository::new(pool.clone()));
        let commissions = Arc::new(SqliteCommissionRepository::new(pool.clone()));
        let withdrawals = Arc::new(SqliteWithdrawalRepository::new(pool.clone()));
        let cache = DashboardCache::new();

        let wallet = WalletService::new(
            Arc::clone(&agents),
            Arc::clone(&commissions),
            Arc::clone(&withdrawals),
            cache.clone(),
        );
        let dashboard = DashboardService::new(agents, commissions, withdrawals, cache.clone(), &config.cache)
            .with_retry(RetryPolicy::from(&config.retry));

        Self {
            pool,
            cache,
            wallet,
            dashboard,
        }
    }
}
