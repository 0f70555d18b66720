//! Small numeric helpers shared by the detectors. All standard deviations
//! here are population (divide by n), matching how the thresholds were
//! tuned.

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Median of day-gap counts; an even count averages the two middle values.
pub fn median_i64(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    } else {
        sorted[mid] as f64
    }
}

/// Gap irregularity: population std dev over mean. A zero mean reads as
/// infinitely irregular.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    population_std_dev(values) / mean(values)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
