use chrono::NaiveDate;
use serde::Deserialize;

use quid_core::{date_from_mjd, month_key, Amount};

// ── Amounts ──────────────────────────────────────────────────────────────────

/// One commodity amount as the engine reports it. Style and commodity
/// metadata are ignored; only the float quantity is read.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportAmount {
    pub aquantity: Quantity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Quantity {
    #[serde(rename = "floatingPoint")]
    pub floating_point: f64,
}

/// First listed commodity wins; an empty cell is zero.
pub fn cell_amount(amounts: &[ReportAmount]) -> Amount {
    amounts
        .first()
        .map(|a| Amount::from_f64(a.aquantity.floating_point))
        .unwrap_or_else(Amount::zero)
}

// ── Period dates ─────────────────────────────────────────────────────────────

/// A period boundary. Engine versions differ: newer ones emit ISO date
/// strings, older ones emit Modified Julian Day numbers.
#[derive(Debug, Clone, Deserialize)]
pub struct PeriodDate {
    pub contents: DateContents,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DateContents {
    Iso(String),
    ModifiedJulianDay(i64),
}

impl PeriodDate {
    /// The month bucket label, `YYYY-MM`.
    pub fn year_month(&self) -> String {
        match &self.contents {
            DateContents::Iso(text) => text.chars().take(7).collect(),
            DateContents::ModifiedJulianDay(mjd) => {
                date_from_mjd(*mjd).map(month_key).unwrap_or_default()
            }
        }
    }
}

/// Month labels for a report's period columns. Each period is a start/end
/// pair; the start names the bucket.
pub fn month_labels(dates: &[Vec<PeriodDate>]) -> Vec<String> {
    dates
        .iter()
        .map(|pair| pair.first().map(PeriodDate::year_month).unwrap_or_default())
        .collect()
}

// ── Periodic balance reports ─────────────────────────────────────────────────

/// Periodic balance report: one row per account, one amount column per
/// period bucket.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeriodicReport {
    #[serde(default, rename = "prDates")]
    pub dates: Vec<Vec<PeriodDate>>,
    #[serde(default, rename = "prRows")]
    pub rows: Vec<PeriodicRow>,
    #[serde(default, rename = "prTotals")]
    pub totals: PeriodicTotals,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PeriodicRow {
    #[serde(rename = "prrName")]
    pub name: String,
    #[serde(default, rename = "prrAmounts")]
    pub amounts: Vec<Vec<ReportAmount>>,
    #[serde(default, rename = "prrTotal")]
    pub total: Vec<ReportAmount>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeriodicTotals {
    #[serde(default, rename = "prrAmounts")]
    pub amounts: Vec<Vec<ReportAmount>>,
    #[serde(default, rename = "prrTotal")]
    pub total: Vec<ReportAmount>,
}

impl PeriodicRow {
    /// The row's amount in period column `index`, zero when the column is
    /// missing or empty.
    pub fn amount_at(&self, index: usize) -> Amount {
        self.amounts
            .get(index)
            .map(|cell| cell_amount(cell))
            .unwrap_or_else(Amount::zero)
    }

    pub fn total_amount(&self) -> Amount {
        cell_amount(&self.total)
    }
}

// ── Compound reports ─────────────────────────────────────────────────────────

/// Compound report (balance sheet, income statement): titled subreports in
/// a fixed order plus overall totals.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompoundReport {
    #[serde(default, rename = "cbrDates")]
    pub dates: Vec<Vec<PeriodDate>>,
    #[serde(default, rename = "cbrSubreports")]
    pub subreports: Vec<(String, PeriodicReport, bool)>,
    #[serde(default, rename = "cbrTotals")]
    pub totals: PeriodicTotals,
}

impl CompoundReport {
    pub fn subreport(&self, index: usize) -> Option<&PeriodicReport> {
        self.subreports.get(index).map(|(_, report, _)| report)
    }
}

// ── Budget reports ───────────────────────────────────────────────────────────

/// A budget report cell: pair of amount lists, actual first, goal second.
pub type BudgetCell = Vec<Vec<ReportAmount>>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetReport {
    #[serde(default, rename = "prDates")]
    pub dates: Vec<Vec<PeriodDate>>,
    #[serde(default, rename = "prRows")]
    pub rows: Vec<BudgetRow>,
    #[serde(default, rename = "prTotals")]
    pub totals: BudgetTotals,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BudgetRow {
    #[serde(rename = "prrName")]
    pub name: String,
    #[serde(default, rename = "prrAmounts")]
    pub amounts: Vec<BudgetCell>,
    #[serde(default, rename = "prrTotal")]
    pub total: BudgetCell,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetTotals {
    #[serde(default, rename = "prrAmounts")]
    pub amounts: Vec<BudgetCell>,
    #[serde(default, rename = "prrTotal")]
    pub total: BudgetCell,
}

/// Splits a budget cell into absolute (actual, goal). Either half may be
/// absent for a given account and period.
pub fn budget_cell(cell: &BudgetCell) -> (Amount, Amount) {
    let actual = cell
        .first()
        .map(|amounts| cell_amount(amounts).abs())
        .unwrap_or_else(Amount::zero);
    let goal = cell
        .get(1)
        .map(|amounts| cell_amount(amounts).abs())
        .unwrap_or_else(Amount::zero);
    (actual, goal)
}

impl BudgetRow {
    pub fn cell_at(&self, index: usize) -> (Amount, Amount) {
        self.amounts
            .get(index)
            .map(budget_cell)
            .unwrap_or_else(|| (Amount::zero(), Amount::zero()))
    }
}

// ── Register rows ────────────────────────────────────────────────────────────

/// One register line: transaction date, secondary date, description, the
/// posting itself, and a running total this reader ignores.
pub type RegisterRow = (
    NaiveDate,
    Option<String>,
    String,
    RegisterPosting,
    serde::de::IgnoredAny,
);

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterPosting {
    pub paccount: String,
    #[serde(default)]
    pub pamount: Vec<ReportAmount>,
}

// ── Flat balance reports ─────────────────────────────────────────────────────

/// Non-periodic balance output: account rows plus a grand total.
pub type FlatBalance = (Vec<FlatBalanceRow>, Vec<ReportAmount>);

/// Full account name, display name, indent depth, amounts.
pub type FlatBalanceRow = (String, String, i64, Vec<ReportAmount>);
