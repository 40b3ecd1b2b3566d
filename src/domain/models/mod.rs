pub mod agent;
pub mod commission;
pub mod config;
pub mod dashboard;
pub mod network;
pub mod wallet;
pub mod withdrawal;

pub use agent::{Agent, LegacyAggregate};
pub use commission::{
    CommissionRecord, CommissionStatus, SourceType, CLAMP_FLOOR, COMMISSION_CAP,
};
pub use config::{CacheConfig, Config, DatabaseConfig, LoggingConfig, RetryConfig};
pub use dashboard::{AdminDashboard, AdminDashboardRow, AgentDashboard};
pub use network::{normalize_phone, MobileNetwork};
pub use wallet::{BalanceSource, CommissionAnomaly, WalletSummary};
pub use withdrawal::{WithdrawalRequest, WithdrawalSource, WithdrawalStatus};
