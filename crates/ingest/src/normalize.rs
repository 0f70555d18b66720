use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use quid_core::Amount;

use crate::error::ParseError;
use crate::re;

re!(re_date_iso, r"^(\d{4})-(\d{2})-(\d{2})$");
re!(re_date_day_first, r"^(\d{1,2})[/\-.](\d{1,2})[/\-.](\d{4})$");
re!(re_date_abbr_month, r"(?i)^(\d{1,2})\s+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)\s+(\d{4})$");

// ── Dates ────────────────────────────────────────────────────────────────────
//
// Tried most to least specific. Numeric day-first forms follow the UK
// convention: 04/03/2025 is 4 March, never 3 April.

fn try_date_iso(s: &str) -> Option<NaiveDate> {
    let c = re_date_iso().captures(s)?;
    let y: i32 = c.get(1)?.as_str().parse().ok()?;
    let m: u32 = c.get(2)?.as_str().parse().ok()?;
    let d: u32 = c.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(y, m, d)
}

fn try_date_day_first(s: &str) -> Option<NaiveDate> {
    let c = re_date_day_first().captures(s)?;
    let d: u32 = c.get(1)?.as_str().parse().ok()?;
    let m: u32 = c.get(2)?.as_str().parse().ok()?;
    let y: i32 = c.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(y, m, d)
}

fn try_date_abbr_month(s: &str) -> Option<NaiveDate> {
    let c = re_date_abbr_month().captures(s)?;
    let d: u32 = c.get(1)?.as_str().parse().ok()?;
    let m = abbr_month_to_num(c.get(2)?.as_str())?;
    let y: i32 = c.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(y, m, d)
}

fn abbr_month_to_num(name: &str) -> Option<u32> {
    match name.to_lowercase().as_str() {
        "jan" => Some(1), "feb" => Some(2), "mar" => Some(3), "apr" => Some(4),
        "may" => Some(5), "jun" => Some(6), "jul" => Some(7), "aug" => Some(8),
        "sep" => Some(9), "oct" => Some(10), "nov" => Some(11), "dec" => Some(12),
        _ => None,
    }
}

/// Normalizes heterogeneous statement dates to a calendar date. Shapes that
/// match but name an impossible date (2025-02-30) are rejected the same as
/// unrecognized text.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ParseError> {
    let s = raw.trim();
    if let Some(d) = try_date_iso(s) {
        return Ok(d);
    }
    if let Some(d) = try_date_day_first(s) {
        return Ok(d);
    }
    if let Some(d) = try_date_abbr_month(s) {
        return Ok(d);
    }
    Err(ParseError::BadDate(raw.to_string()))
}

// ── Amounts ──────────────────────────────────────────────────────────────────

/// Cleans and parses a statement amount. Currency symbols, thousands commas
/// and whitespace are stripped; the sign is kept; the result is rounded to
/// cents. Empty or unparsable text reads as zero, which the builder then
/// discards as a degenerate row.
pub fn parse_amount(raw: &str) -> Amount {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '£' | '$' | '€' | ',') && !c.is_whitespace())
        .collect();
    match Decimal::from_str(&cleaned) {
        Ok(d) => Amount::from_decimal(d),
        Err(_) => Amount::zero(),
    }
}

/// Split-column amounts: a positive debit is money out; failing that, a
/// positive credit is money in, carried negative.
pub fn resolve_split(debit: Amount, credit: Amount) -> Amount {
    if debit.is_expense() {
        debit
    } else {
        -credit
    }
}
