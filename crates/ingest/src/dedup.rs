use std::collections::HashSet;
use std::str::FromStr;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

use quid_core::{Amount, IdentityKey, Transaction};

use crate::re;

re!(re_entry_header, r"^(\d{4}-\d{2}-\d{2})\s+(.+)$");

/// Identity keys reconstructed from previously recorded journal text.
/// Rebuilt from the full journal on every import; nothing is persisted.
#[derive(Debug, Default)]
pub struct DedupIndex {
    keys: HashSet<IdentityKey>,
}

impl DedupIndex {
    /// Scans journal entries of the shape
    ///
    /// ```text
    /// 2025-04-01 Tesco
    ///     expenses:unknown    £45.80
    ///     assets:bank:checking
    /// ```
    ///
    /// keying each entry on its header line plus the first posting carrying
    /// a currency amount. Both sign variants are registered: the journal may
    /// hold either leg of the event, and a re-import must be suppressed no
    /// matter which side was recorded.
    pub fn from_journal(text: &str, currency: &str) -> Self {
        let posting = Regex::new(&format!(
            r"^\s+\S+.*{}([\d.]+)",
            regex::escape(currency)
        ))
        .expect("invalid regex");

        let mut keys = HashSet::new();
        let mut current: Option<(NaiveDate, String)> = None;
        for line in text.lines() {
            if let Some(c) = re_entry_header().captures(line) {
                current = NaiveDate::parse_from_str(&c[1], "%Y-%m-%d")
                    .ok()
                    .map(|date| (date, c[2].trim().to_string()));
                continue;
            }
            let Some((date, description)) = current.as_ref() else {
                continue;
            };
            if let Some(c) = posting.captures(line) {
                if let Ok(dec) = Decimal::from_str(&c[1]) {
                    let amount = Amount::from_decimal(dec);
                    for key in IdentityKey::sign_variants(*date, description, amount) {
                        keys.insert(key);
                    }
                }
                current = None;
            }
        }

        DedupIndex { keys }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, tx: &Transaction) -> bool {
        self.keys.contains(&tx.identity_key())
    }

    /// Drops transactions already present in the journal. Returns the
    /// survivors and the count suppressed.
    pub fn filter_new(&self, transactions: Vec<Transaction>) -> (Vec<Transaction>, usize) {
        let total = transactions.len();
        let kept: Vec<Transaction> = transactions
            .into_iter()
            .filter(|t| !self.contains(t))
            .collect();
        let skipped = total - kept.len();
        (kept, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOURNAL: &str = "\
2025-04-01 Tesco
    expenses:unknown    £45.80
    assets:bank:checking

2025-04-02 Salary
    income:unknown    £2000.00
    assets:bank:checking
";

    fn tx(date: (i32, u32, u32), desc: &str, cents: i64) -> Transaction {
        Transaction::new(
            NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            desc,
            Amount::from_cents(cents),
        )
    }

    #[test]
    fn recorded_entries_are_suppressed() {
        let index = DedupIndex::from_journal(JOURNAL, "£");
        assert!(index.contains(&tx((2025, 4, 1), "Tesco", 4580)));
        let (kept, skipped) = index.filter_new(vec![
            tx((2025, 4, 1), "Tesco", 4580),
            tx((2025, 4, 3), "Asda", 1200),
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].description, "Asda");
        assert_eq!(skipped, 1);
    }

    #[test]
    fn either_sign_is_suppressed() {
        let index = DedupIndex::from_journal(JOURNAL, "£");
        // Recorded as income, re-imported with the expense sign.
        assert!(index.contains(&tx((2025, 4, 2), "Salary", 200000)));
        assert!(index.contains(&tx((2025, 4, 2), "Salary", -200000)));
    }

    #[test]
    fn different_amount_is_not_suppressed() {
        let index = DedupIndex::from_journal(JOURNAL, "£");
        assert!(!index.contains(&tx((2025, 4, 1), "Tesco", 4581)));
        assert!(!index.contains(&tx((2025, 4, 1), "Tesco Metro", 4580)));
    }

    #[test]
    fn only_first_amount_posting_keys_an_entry() {
        let text = "\
2025-04-01 Split purchase
    expenses:food    £30.00
    expenses:household    £15.80
    assets:bank:checking
";
        let index = DedupIndex::from_journal(text, "£");
        assert!(index.contains(&tx((2025, 4, 1), "Split purchase", 3000)));
        assert!(!index.contains(&tx((2025, 4, 1), "Split purchase", 1580)));
    }

    #[test]
    fn empty_and_malformed_text_yield_empty_index() {
        assert!(DedupIndex::from_journal("", "£").is_empty());
        assert!(DedupIndex::from_journal("; just a comment\nnot an entry\n", "£").is_empty());
        // Date-shaped but impossible header is skipped.
        assert!(DedupIndex::from_journal("2025-13-45 Ghost\n    a    £5.00\n", "£").is_empty());
    }

    #[test]
    fn respects_configured_currency_symbol() {
        let text = "2025-04-01 Coffee\n    expenses:unknown    $4.50\n    assets:cash\n";
        let index = DedupIndex::from_journal(text, "$");
        assert!(index.contains(&tx((2025, 4, 1), "Coffee", 450)));
        assert_eq!(DedupIndex::from_journal(text, "£").len(), 0);
    }
}
