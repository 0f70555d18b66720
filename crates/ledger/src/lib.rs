//! Adapter around the plain-text accounting engine: engine configuration,
//! subprocess execution with a deadline, JSON report decoding, the
//! uploaded-journal store, and the reporting operations built on top.

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static regex::Regex {
            static R: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
            R.get_or_init(|| regex::Regex::new($pat).expect("invalid regex"))
        }
    };
}
pub(crate) use re;

pub mod config;
pub mod error;
pub mod ops;
pub mod report;
pub mod runner;
pub mod store;

pub use config::{DetectionSettings, EngineConfig};
pub use error::LedgerError;
pub use ops::{
    BudgetComparison, DataInfo, FinancialSummary, Interval, MonthlySpendRow, NetWorthTimeline,
    Reports, SpendingBreakdown, TransactionSearch, TrendsResult,
};
pub use runner::HledgerRunner;
pub use store::{CategoryMapping, JournalStore, RecategorizeOutcome};
