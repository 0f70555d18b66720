use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::money::Amount;

/// The canonical record every downstream stage operates on. Built once by
/// the import pipeline, immutable after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Amount,
}

impl Transaction {
    pub fn new(date: NaiveDate, description: impl Into<String>, amount: Amount) -> Self {
        Transaction {
            date,
            description: description.into(),
            amount,
        }
    }

    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::derive(self.date, &self.description, self.amount)
    }
}

/// One reported ledger posting: a transaction leg with the account it hit,
/// as the engine's register returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub date: NaiveDate,
    pub description: String,
    pub account: String,
    pub amount: Amount,
}

/// Stable digest of `(date, description, signed amount)`. Two keys are equal
/// exactly when all three parts are equal after cent rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityKey([u8; 32]);

impl IdentityKey {
    pub fn derive(date: NaiveDate, description: &str, amount: Amount) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(date.to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(description.as_bytes());
        hasher.update(b"|");
        hasher.update(amount.to_string().as_bytes());
        IdentityKey(hasher.finalize().into())
    }

    /// Both signed forms of one economic event. A posting recorded on the
    /// expense side must also suppress a re-import reported on the income
    /// side, so dedup sets register the pair.
    pub fn sign_variants(date: NaiveDate, description: &str, amount: Amount) -> [Self; 2] {
        [
            IdentityKey::derive(date, description, amount),
            IdentityKey::derive(date, description, -amount),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn key_is_deterministic() {
        let a = Transaction::new(date(2025, 4, 1), "Tesco", Amount::from_cents(4580));
        let b = Transaction::new(date(2025, 4, 1), "Tesco", Amount::from_cents(4580));
        assert_eq!(a.identity_key(), b.identity_key());
    }

    #[test]
    fn key_varies_with_each_part() {
        let base = Transaction::new(date(2025, 4, 1), "Tesco", Amount::from_cents(4580));
        let other_date = Transaction::new(date(2025, 4, 2), "Tesco", Amount::from_cents(4580));
        let other_desc = Transaction::new(date(2025, 4, 1), "Asda", Amount::from_cents(4580));
        let other_amount = Transaction::new(date(2025, 4, 1), "Tesco", Amount::from_cents(4581));
        assert_ne!(base.identity_key(), other_date.identity_key());
        assert_ne!(base.identity_key(), other_desc.identity_key());
        assert_ne!(base.identity_key(), other_amount.identity_key());
    }

    #[test]
    fn sign_variants_cover_both_legs() {
        let variants =
            IdentityKey::sign_variants(date(2025, 4, 1), "Salary", Amount::from_cents(200000));
        let income = Transaction::new(date(2025, 4, 1), "Salary", Amount::from_cents(-200000));
        let expense = Transaction::new(date(2025, 4, 1), "Salary", Amount::from_cents(200000));
        assert!(variants.contains(&income.identity_key()));
        assert!(variants.contains(&expense.identity_key()));
    }
}
