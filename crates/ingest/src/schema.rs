use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::res;

// ── Role pattern tables ──────────────────────────────────────────────────────
//
// Ordered per role; a header claims a role if any pattern matches it, and the
// first (leftmost) claiming header wins.

res!(
    date_patterns,
    r"(?i)^date$",
    r"(?i)^transaction.?date$",
    r"(?i)^posted$",
    r"(?i)^booking.?date$",
    r"(?i)^value.?date$",
);

res!(
    description_patterns,
    r"(?i)^desc",
    r"(?i)^narrative$",
    r"(?i)^memo$",
    r"(?i)^reference$",
    r"(?i)^detail",
    r"(?i)^transaction.?desc",
    r"(?i)^payee$",
);

res!(amount_patterns, r"(?i)^amount$", r"(?i)^value$", r"(?i)^sum$");

res!(
    debit_patterns,
    r"(?i)^debit$",
    r"(?i)^money.?out$",
    r"(?i)^paid.?out$",
    r"(?i)^withdrawal",
    r"(?i)^expense",
);

res!(
    credit_patterns,
    r"(?i)^credit$",
    r"(?i)^money.?in$",
    r"(?i)^paid.?in$",
    r"(?i)^deposit",
    r"(?i)^income",
);

// ── Mapping ──────────────────────────────────────────────────────────────────

/// Which header names carry which semantic role. Date and description are
/// mandatory; `amount` selects single-amount mode and takes precedence over
/// the split debit/credit pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub date: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit: Option<String>,
}

/// Header indices behind a validated mapping.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolvedColumns {
    pub date: usize,
    pub description: usize,
    pub amount: Option<usize>,
    pub debit: Option<usize>,
    pub credit: Option<usize>,
}

fn claim(headers: &[String], patterns: &[Regex]) -> Option<usize> {
    headers
        .iter()
        .position(|h| patterns.iter().any(|p| p.is_match(h)))
}

/// Auto-detects a mapping from header names alone. Fails when no date or
/// description column is recognized, or when no amount-bearing column of
/// either form is.
pub fn detect(headers: &[String]) -> Result<ColumnMapping, ConfigError> {
    let date = claim(headers, date_patterns());
    let description = claim(headers, description_patterns());
    let (date, description) = match (date, description) {
        (Some(d), Some(s)) => (d, s),
        _ => return Err(ConfigError::DetectionFailed(headers.to_vec())),
    };

    let amount = claim(headers, amount_patterns());
    let (debit, credit) = if amount.is_some() {
        (None, None)
    } else {
        (
            claim(headers, debit_patterns()),
            claim(headers, credit_patterns()),
        )
    };
    if amount.is_none() && debit.is_none() && credit.is_none() {
        return Err(ConfigError::DetectionFailed(headers.to_vec()));
    }

    Ok(ColumnMapping {
        date: headers[date].clone(),
        description: headers[description].clone(),
        amount: amount.map(|i| headers[i].clone()),
        debit: debit.map(|i| headers[i].clone()),
        credit: credit.map(|i| headers[i].clone()),
    })
}

impl ColumnMapping {
    /// Validates every named column against the actual header row. Errors
    /// name the missing column and the headers seen.
    pub(crate) fn resolve(&self, headers: &[String]) -> Result<ResolvedColumns, ConfigError> {
        let find = |role: &'static str, name: &str| -> Result<usize, ConfigError> {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| ConfigError::MissingColumn {
                    role,
                    column: name.to_string(),
                    headers: headers.to_vec(),
                })
        };

        Ok(ResolvedColumns {
            date: find("date", &self.date)?,
            description: find("description", &self.description)?,
            amount: self.amount.as_deref().map(|n| find("amount", n)).transpose()?,
            debit: self.debit.as_deref().map(|n| find("debit", n)).transpose()?,
            credit: self.credit.as_deref().map(|n| find("credit", n)).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn detects_single_amount_mapping() {
        let m = detect(&headers(&["Date", "Description", "Amount"])).unwrap();
        assert_eq!(m.date, "Date");
        assert_eq!(m.description, "Description");
        assert_eq!(m.amount.as_deref(), Some("Amount"));
        assert!(m.debit.is_none() && m.credit.is_none());
    }

    #[test]
    fn detects_split_column_mapping() {
        let m = detect(&headers(&["Date", "Narrative", "Debit", "Credit"])).unwrap();
        assert!(m.amount.is_none());
        assert_eq!(m.debit.as_deref(), Some("Debit"));
        assert_eq!(m.credit.as_deref(), Some("Credit"));
    }

    #[test]
    fn amount_takes_precedence_over_split() {
        let m = detect(&headers(&["Date", "Desc", "Amount", "Debit", "Credit"])).unwrap();
        assert_eq!(m.amount.as_deref(), Some("Amount"));
        assert!(m.debit.is_none() && m.credit.is_none());
    }

    #[test]
    fn detection_failure_names_headers() {
        let err = detect(&headers(&["Foo", "Bar"])).unwrap_err();
        assert!(err.to_string().contains("Foo, Bar"));
    }

    #[test]
    fn missing_amount_column_fails() {
        assert!(detect(&headers(&["Date", "Description"])).is_err());
    }

    #[test]
    fn bank_export_variants_are_recognized() {
        let m = detect(&headers(&[
            "Transaction Date",
            "Details",
            "Money Out",
            "Paid In",
        ]))
        .unwrap();
        assert_eq!(m.date, "Transaction Date");
        assert_eq!(m.description, "Details");
        assert_eq!(m.debit.as_deref(), Some("Money Out"));
        assert_eq!(m.credit.as_deref(), Some("Paid In"));

        let m = detect(&headers(&["Value Date", "Payee", "Withdrawals", "Deposits"])).unwrap();
        assert_eq!(m.date, "Value Date");
        assert_eq!(m.debit.as_deref(), Some("Withdrawals"));
        assert_eq!(m.credit.as_deref(), Some("Deposits"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let m = detect(&headers(&["POSTED", "MEMO", "SUM"])).unwrap();
        assert_eq!(m.date, "POSTED");
        assert_eq!(m.description, "MEMO");
        assert_eq!(m.amount.as_deref(), Some("SUM"));
    }

    #[test]
    fn value_date_is_not_an_amount() {
        let m = detect(&headers(&["Value Date", "Details", "Value"])).unwrap();
        assert_eq!(m.date, "Value Date");
        assert_eq!(m.amount.as_deref(), Some("Value"));
    }

    #[test]
    fn first_claiming_header_wins() {
        let m = detect(&headers(&["Posted", "Booking Date", "Reference", "Amount"])).unwrap();
        assert_eq!(m.date, "Posted");
    }

    #[test]
    fn resolve_rejects_unknown_column() {
        let m = ColumnMapping {
            date: "Date".to_string(),
            description: "Nope".to_string(),
            amount: Some("Amount".to_string()),
            debit: None,
            credit: None,
        };
        let err = m.resolve(&headers(&["Date", "Description", "Amount"])).unwrap_err();
        match err {
            ConfigError::MissingColumn { role, column, .. } => {
                assert_eq!(role, "description");
                assert_eq!(column, "Nope");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn resolve_is_exact_match() {
        let m = ColumnMapping {
            date: "date".to_string(),
            description: "Description".to_string(),
            amount: Some("Amount".to_string()),
            debit: None,
            credit: None,
        };
        // Manual mappings must name headers exactly as they appear.
        assert!(m.resolve(&headers(&["Date", "Description", "Amount"])).is_err());
    }
}
