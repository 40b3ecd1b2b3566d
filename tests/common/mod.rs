//! Common test utilities for integration tests
//!
//! Builds the wallet and dashboard services over a fully migrated SQLite
//! pool with one shared dashboard cache. The default pool is a single
//! in-memory connection; `file_harness` opens a multi-connection pool on a
//! database file so transactions from different tasks really overlap.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use dataflex::adapters::cache::DashboardCache;
use dataflex::adapters::sqlite::{
    create_migrated_test_pool, initialize_database, SqliteAgentRepository,
    SqliteCommissionRepository, SqliteWithdrawalRepository,
};
use dataflex::domain::models::{Agent, CacheConfig, CommissionStatus, SourceType};
use dataflex::services::{DashboardService, WalletService};
use sqlx::SqlitePool;

pub type TestWallet =
    WalletService<SqliteAgentRepository, SqliteCommissionRepository, SqliteWithdrawalRepository>;
pub type TestDashboard =
    DashboardService<SqliteAgentRepository, SqliteCommissionRepository, SqliteWithdrawalRepository>;

pub struct Harness {
    pub pool: SqlitePool,
    pub agents: Arc<SqliteAgentRepository>,
    pub commissions: Arc<SqliteCommissionRepository>,
    pub withdrawals: Arc<SqliteWithdrawalRepository>,
    pub cache: DashboardCache,
    pub wallet: TestWallet,
    pub dashboard: TestDashboard,
}

pub async fn harness() -> Harness {
    let pool = create_migrated_test_pool()
        .await
        .expect("Failed to create migrated test pool");
    harness_with_pool(pool)
}

/// Harness over a database file inside `dir`, using the default pool size.
pub async fn file_harness(dir: &Path) -> Harness {
    let url = format!("sqlite:{}", dir.join("dataflex.db").display());
    let pool = initialize_database(&url, None)
        .await
        .expect("Failed to initialize file database");
    harness_with_pool(pool)
}

pub fn harness_with_pool(pool: SqlitePool) -> Harness {
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
    let dashboard = DashboardService::new(
        Arc::clone(&agents),
        Arc::clone(&commissions),
        Arc::clone(&withdrawals),
        cache.clone(),
        &CacheConfig::default(),
    );

    Harness {
        pool,
        agents,
        commissions,
        withdrawals,
        cache,
        wallet,
        dashboard,
    }
}

impl Harness {
    pub async fn agent(&self, name: &str, phone: &str) -> Agent {
        self.wallet
            .register_agent(name, phone, None)
            .await
            .expect("Failed to register agent")
    }

    pub async fn earn(&self, agent: &Agent, source_id: &str, amount: f64) {
        self.wallet
            .record_commission(agent.id, SourceType::DataOrder, source_id, amount, CommissionStatus::Earned)
            .await
            .expect("Failed to record commission");
    }
}

/// Float comparison for money totals built from summed f64s.
pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// Setup test logging
///
/// Call at the start of tests whose tracing output helps when debugging.
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
