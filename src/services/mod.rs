pub mod dashboard_service;
pub mod ledger;
pub mod retry;
pub mod wallet_service;

pub use dashboard_service::DashboardService;
pub use ledger::{clamp_amount, meets_constraints, summarize, ConstraintCheck};
pub use retry::RetryPolicy;
pub use wallet_service::WalletService;
