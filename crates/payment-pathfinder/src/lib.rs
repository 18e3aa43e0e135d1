// Library entry point for payment-pathfinder

pub mod cache;
pub mod config;
pub mod engine;
pub mod ledger;
pub mod load;
pub mod types;

pub use cache::{CacheMetrics, LineCache};
pub use config::EngineConfig;
pub use engine::path::{Path, PathElement, PathSet};
pub use engine::ranking::PathRank;
pub use engine::settlement::{SettlementOracle, SettlementOutcome, SettlementStatus};
pub use engine::templates::{classify, PaymentType};
pub use engine::{init_path_table, BestPaths, Pathfinder};
pub use ledger::{LedgerBuilder, LedgerSnapshot, LedgerView, TrustLine};
pub use load::{LoadEvent, LoadMonitor};
pub use types::{AccountId, Amount, Currency, Issue, PathfinderError, Result};
