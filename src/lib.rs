//! DataFlex - agent wallets and commission ledger
//!
//! Agents earn small per-order commissions (capped at GH₵ 0.40 each), see
//! them on a dashboard and withdraw their available balance. Dashboard reads
//! go through a TTL request cache that collapses concurrent misses for the
//! same key into a single load.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and repository ports
//! - **Service Layer** (`services`): ledger arithmetic, wallets, dashboards, retry
//! - **Adapters** (`adapters`): SQLite repositories and the request cache
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): the `dataflex` command-line interface
//!
//! # Example
//!
//! ```ignore
//! use dataflex::adapters::cache::RequestCache;
//! use std::time::Duration;
//!
//! let cache: RequestCache<u64, std::io::Error> = RequestCache::new();
//! let value = cache
//!     .get_or_fetch("answer", || async { Ok(42) }, Duration::from_secs(30))
//!     .await?;
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use adapters::cache::{DashboardCache, FetchResult, RequestCache};
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Agent, BalanceSource, CommissionRecord, CommissionStatus, Config, LegacyAggregate,
    MobileNetwork, SourceType, WalletSummary, WithdrawalRequest, WithdrawalStatus,
};
pub use domain::ports::{AgentRepository, CommissionRepository, WithdrawalRepository};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    clamp_amount, meets_constraints, summarize, ConstraintCheck, DashboardService, RetryPolicy,
    WalletService,
};
