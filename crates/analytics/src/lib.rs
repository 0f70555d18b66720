//! Pattern detection over reported ledger data: recurring-charge detection
//! from register postings and per-category monthly anomaly detection.
//! Everything here is a pure transformation, recomputed per call.

pub mod anomaly;
pub mod recurring;
pub mod stats;

pub use anomaly::{
    detect_anomalies, Anomaly, AnomalyConfig, CategorySeries, Direction, MonthlyAmount, Severity,
};
pub use recurring::{detect_recurring, RecurrencePattern, RecurringConfig};
