use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::Serialize;

use quid_core::Amount;

use crate::stats;

#[derive(Debug, Clone)]
pub struct AnomalyConfig {
    /// A category needs at least this many non-zero months to be judged.
    pub min_months: usize,
    /// Flag a month when the absolute z-score reaches this.
    pub flag_z: f64,
    /// Severity turns high when the absolute z-score reaches this.
    pub high_z: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        AnomalyConfig {
            min_months: 3,
            flag_z: 1.5,
            high_z: 2.0,
        }
    }
}

/// One category's spending per month bucket, absolute amounts. Zero months
/// mean no spending and carry no signal.
#[derive(Debug, Clone)]
pub struct CategorySeries {
    pub category: String,
    pub points: Vec<MonthlyAmount>,
}

#[derive(Debug, Clone)]
pub struct MonthlyAmount {
    pub month: String,
    pub amount: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Above,
    Below,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    pub category: String,
    pub month: String,
    pub amount: Amount,
    pub average_for_category: Amount,
    pub z_score_deviation: f64,
    pub severity: Severity,
    pub direction: Direction,
}

/// Flags months whose spend sits far from the category's own mean. The
/// reported deviation is the z-score rounded to two decimals, and severity
/// is judged on that reported value, so a month printing as 2.00 reads
/// high.
pub fn detect_anomalies(series: &[CategorySeries], config: &AnomalyConfig) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();

    for cat in series {
        let nonzero: Vec<&MonthlyAmount> =
            cat.points.iter().filter(|p| !p.amount.is_zero()).collect();
        if nonzero.len() < config.min_months {
            continue;
        }

        let values: Vec<f64> = nonzero
            .iter()
            .map(|p| p.amount.as_decimal().to_f64().unwrap_or(0.0))
            .collect();
        let avg = stats::mean(&values);
        let std_dev = stats::population_std_dev(&values);
        if std_dev == 0.0 {
            continue;
        }
        let average_for_category =
            Amount::from_decimal(Decimal::from_f64(avg).unwrap_or_default());

        for (point, value) in nonzero.iter().zip(&values) {
            let z = stats::round2((value - avg) / std_dev);
            if z.abs() < config.flag_z {
                continue;
            }
            anomalies.push(Anomaly {
                category: cat.category.clone(),
                month: point.month.clone(),
                amount: point.amount,
                average_for_category,
                z_score_deviation: z,
                severity: if z.abs() >= config.high_z {
                    Severity::High
                } else {
                    Severity::Medium
                },
                direction: if z > 0.0 {
                    Direction::Above
                } else {
                    Direction::Below
                },
            });
        }
    }

    anomalies.sort_by(|a, b| {
        a.severity.cmp(&b.severity).then(
            b.z_score_deviation
                .abs()
                .total_cmp(&a.z_score_deviation.abs()),
        )
    });
    anomalies
}
