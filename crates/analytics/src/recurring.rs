use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, TimeDelta};
use rust_decimal::Decimal;
use serde::Serialize;

use quid_core::{Amount, Frequency, Posting};

use crate::stats;

#[derive(Debug, Clone)]
pub struct RecurringConfig {
    /// Groups below this many occurrences are never considered.
    pub min_occurrences: usize,
    /// Reject a group whose gap coefficient of variation exceeds this.
    pub max_gap_cv: f64,
    /// How many trailing amounts each pattern carries for display.
    pub recent_amounts: usize,
}

impl Default for RecurringConfig {
    fn default() -> Self {
        RecurringConfig {
            min_occurrences: 3,
            max_gap_cv: 0.5,
            recent_amounts: 5,
        }
    }
}

/// A charge that repeats on a recognized cadence. Recomputed fresh from the
/// full register on every run; nothing is persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrencePattern {
    pub description: String,
    pub account: String,
    pub average_amount: Amount,
    pub frequency: Frequency,
    pub occurrence_count: usize,
    pub last_date: NaiveDate,
    pub next_expected_date: NaiveDate,
    pub recent_amounts: Vec<Amount>,
}

/// Groups register postings by normalized description and keeps the groups
/// whose day-gap median lands in a cadence window with acceptably regular
/// spacing. Output is ordered weekly, monthly, quarterly, yearly, ties by
/// descending average amount.
pub fn detect_recurring(postings: &[Posting], config: &RecurringConfig) -> Vec<RecurrencePattern> {
    let mut groups: BTreeMap<String, Vec<&Posting>> = BTreeMap::new();
    for posting in postings {
        let key = posting.description.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        groups.entry(key).or_default().push(posting);
    }

    let mut patterns = Vec::new();
    for (_, mut group) in groups {
        if group.len() < config.min_occurrences {
            continue;
        }
        group.sort_by_key(|p| p.date);

        let gaps: Vec<i64> = group
            .windows(2)
            .map(|w| (w[1].date - w[0].date).num_days())
            .collect();
        let median_gap = stats::median_i64(&gaps);
        let Some(frequency) = Frequency::classify(median_gap) else {
            continue;
        };

        let gaps_f: Vec<f64> = gaps.iter().map(|&g| g as f64).collect();
        if stats::coefficient_of_variation(&gaps_f) > config.max_gap_cv {
            continue;
        }

        let sum: Decimal = group.iter().map(|p| p.amount.as_decimal().abs()).sum();
        let average_amount = Amount::from_decimal(sum / Decimal::from(group.len() as i64));

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for p in &group {
            *counts.entry(p.account.as_str()).or_insert(0) += 1;
        }
        let mut account = "";
        let mut best = 0;
        for p in &group {
            let c = counts[p.account.as_str()];
            if c > best {
                account = p.account.as_str();
                best = c;
            }
        }

        let last = group[group.len() - 1];
        let recent_amounts: Vec<Amount> = group
            .iter()
            .rev()
            .take(config.recent_amounts)
            .rev()
            .map(|p| p.amount.abs())
            .collect();

        patterns.push(RecurrencePattern {
            description: last.description.clone(),
            account: account.to_string(),
            average_amount,
            frequency,
            occurrence_count: group.len(),
            last_date: last.date,
            next_expected_date: last.date + TimeDelta::days(median_gap.round() as i64),
            recent_amounts,
        });
    }

    patterns.sort_by(|a, b| {
        a.frequency
            .cmp(&b.frequency)
            .then(b.average_amount.cmp(&a.average_amount))
    });
    patterns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn posting(date: NaiveDate, desc: &str, account: &str, cents: i64) -> Posting {
        Posting {
            date,
            description: desc.to_string(),
            account: account.to_string(),
            amount: Amount::from_cents(cents),
        }
    }

    fn series(desc: &str, start: NaiveDate, gap_days: i64, n: usize, cents: i64) -> Vec<Posting> {
        (0..n)
            .map(|i| {
                posting(
                    start + TimeDelta::days(gap_days * i as i64),
                    desc,
                    "expenses:unknown",
                    cents,
                )
            })
            .collect()
    }

    #[test]
    fn monthly_subscription_detected() {
        let postings = series("Netflix", d(2025, 1, 15), 30, 6, 999);
        let patterns = detect_recurring(&postings, &RecurringConfig::default());
        assert_eq!(patterns.len(), 1);
        let p = &patterns[0];
        assert_eq!(p.frequency, Frequency::Monthly);
        assert_eq!(p.occurrence_count, 6);
        assert_eq!(p.average_amount, Amount::from_cents(999));
        assert_eq!(p.last_date, d(2025, 6, 14));
        assert_eq!(p.next_expected_date, d(2025, 7, 14));
        assert_eq!(p.recent_amounts.len(), 5);
    }

    #[test]
    fn weekly_quarterly_yearly_windows() {
        let weekly = series("Gym", d(2025, 1, 1), 7, 5, 1500);
        let quarterly = series("Insurance", d(2024, 1, 1), 91, 4, 12000);
        let yearly = series("Domain", d(2021, 3, 1), 365, 4, 1200);
        let all: Vec<Posting> = [weekly, quarterly, yearly].concat();
        let patterns = detect_recurring(&all, &RecurringConfig::default());
        let freqs: Vec<Frequency> = patterns.iter().map(|p| p.frequency).collect();
        assert_eq!(
            freqs,
            vec![Frequency::Weekly, Frequency::Quarterly, Frequency::Yearly]
        );
    }

    #[test]
    fn irregular_intervals_excluded() {
        // Gaps 3, 45, 2, 90: the median lands outside every cadence window.
        let dates = [
            d(2025, 1, 1),
            d(2025, 1, 4),
            d(2025, 2, 18),
            d(2025, 2, 20),
            d(2025, 5, 21),
        ];
        let postings: Vec<Posting> = dates
            .iter()
            .map(|&date| posting(date, "Corner shop", "expenses:unknown", 500))
            .collect();
        assert!(detect_recurring(&postings, &RecurringConfig::default()).is_empty());
    }

    #[test]
    fn regular_median_but_noisy_gaps_excluded() {
        // Gaps 5,9,5,9,35: median 9 is weekly, but the spread pushes the
        // coefficient of variation past the cutoff.
        let mut date = d(2025, 1, 1);
        let mut postings = vec![posting(date, "Cafe", "expenses:unknown", 350)];
        for gap in [5, 9, 5, 9, 35] {
            date += TimeDelta::days(gap);
            postings.push(posting(date, "Cafe", "expenses:unknown", 350));
        }
        assert!(detect_recurring(&postings, &RecurringConfig::default()).is_empty());
    }

    #[test]
    fn too_few_occurrences_skipped() {
        let postings = series("Rent", d(2025, 1, 1), 30, 2, 85000);
        assert!(detect_recurring(&postings, &RecurringConfig::default()).is_empty());
    }

    #[test]
    fn blank_descriptions_skipped() {
        let postings = series("   ", d(2025, 1, 1), 30, 6, 999);
        assert!(detect_recurring(&postings, &RecurringConfig::default()).is_empty());
    }

    #[test]
    fn grouping_ignores_case_and_keeps_last_casing() {
        let mut postings = series("NETFLIX.COM", d(2025, 1, 15), 30, 5, 999);
        postings.push(posting(d(2025, 6, 14), "netflix.com", "expenses:unknown", 999));
        let patterns = detect_recurring(&postings, &RecurringConfig::default());
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].occurrence_count, 6);
        assert_eq!(patterns[0].description, "netflix.com");
    }

    #[test]
    fn most_frequent_account_wins() {
        let mut postings = series("Spotify", d(2025, 1, 1), 30, 4, 1099);
        for p in postings.iter_mut().take(1) {
            p.account = "expenses:music".to_string();
        }
        let patterns = detect_recurring(&postings, &RecurringConfig::default());
        assert_eq!(patterns[0].account, "expenses:unknown");
    }

    #[test]
    fn ordered_by_cadence_then_amount() {
        let weekly = series("Bus pass", d(2025, 1, 1), 7, 4, 500);
        let big_monthly = series("Rent", d(2025, 1, 1), 30, 4, 85000);
        let small_monthly = series("Netflix", d(2025, 1, 1), 30, 4, 999);
        let all: Vec<Posting> = [small_monthly, weekly, big_monthly].concat();
        let patterns = detect_recurring(&all, &RecurringConfig::default());
        let names: Vec<&str> = patterns.iter().map(|p| p.description.as_str()).collect();
        assert_eq!(names, vec!["Bus pass", "Rent", "Netflix"]);
    }

    #[test]
    fn input_order_does_not_matter() {
        let mut postings = series("Netflix", d(2025, 1, 15), 30, 6, 999);
        postings.reverse();
        let patterns = detect_recurring(&postings, &RecurringConfig::default());
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].last_date, d(2025, 6, 14));
    }

    #[test]
    fn recent_amounts_are_trailing_and_absolute() {
        let mut postings = Vec::new();
        for (i, cents) in [100i64, 200, 300, 400, 500, 600].iter().enumerate() {
            postings.push(posting(
                d(2025, 1, 1) + TimeDelta::days(30 * i as i64),
                "Club",
                "expenses:unknown",
                -cents,
            ));
        }
        let patterns = detect_recurring(&postings, &RecurringConfig::default());
        let recent: Vec<i64> = patterns[0].recent_amounts.iter().map(|a| a.to_cents()).collect();
        assert_eq!(recent, vec![200, 300, 400, 500, 600]);
    }
}
