use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use quid_core::{Amount, DateRange, Posting};

use crate::error::LedgerError;
use crate::re;
use crate::report::{
    budget_cell, cell_amount, month_labels, BudgetReport, CompoundReport, FlatBalance,
    PeriodicReport, RegisterRow,
};
use crate::runner::HledgerRunner;

// ── Payloads ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingBreakdown {
    pub months: Vec<MonthSpending>,
    pub category_totals: Vec<CategoryShare>,
    pub grand_total: Amount,
    pub period: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthSpending {
    pub date: String,
    pub categories: Vec<CategoryAmount>,
    pub total: Amount,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryAmount {
    pub name: String,
    pub amount: Amount,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryShare {
    pub name: String,
    pub amount: Amount,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendsResult {
    pub periods: Vec<PeriodTrend>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodTrend {
    pub date: String,
    pub income: Amount,
    pub expenses: Amount,
    pub net: Amount,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    pub net_worth: Amount,
    pub total_income: Amount,
    pub total_expenses: Amount,
    pub savings_rate: f64,
    pub cashflow: Amount,
    pub top_expenses: Vec<CategoryAmount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetWorthTimeline {
    pub points: Vec<NetWorthPoint>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetWorthPoint {
    pub date: String,
    pub assets: Amount,
    pub liabilities: Amount,
    pub net_worth: Amount,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionSearch {
    pub transactions: Vec<SearchHit>,
    pub count: usize,
    pub query: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub date: NaiveDate,
    pub description: String,
    pub account: String,
    pub amount: Amount,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataInfo {
    pub categories: Vec<String>,
    pub date_range: Option<DateRange>,
    pub transaction_count: usize,
    pub suggested_periods: Vec<SuggestedPeriod>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuggestedPeriod {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetComparison {
    pub categories: Vec<BudgetCategory>,
    pub totals: Vec<BudgetPeriod>,
    pub period: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetCategory {
    pub name: String,
    pub periods: Vec<BudgetPeriod>,
    pub total_actual: Amount,
    pub total_budget: Amount,
    pub total_percentage: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetPeriod {
    pub date: String,
    pub actual: Amount,
    pub budget: Amount,
    pub percentage: i64,
}

/// One expense category's absolute spend per month bucket, ready for the
/// anomaly detector.
#[derive(Debug, Clone)]
pub struct MonthlySpendRow {
    pub category: String,
    pub months: Vec<(String, Amount)>,
}

/// Report bucketing for the trends operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    Weekly,
    Monthly,
    Quarterly,
}

impl Interval {
    fn flag(self) -> &'static str {
        match self {
            Interval::Weekly => "-W",
            Interval::Monthly => "-M",
            Interval::Quarterly => "-Q",
        }
    }
}

impl std::str::FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weekly" => Ok(Interval::Weekly),
            "monthly" => Ok(Interval::Monthly),
            "quarterly" => Ok(Interval::Quarterly),
            other => Err(format!(
                "unknown interval '{other}' (expected weekly, monthly or quarterly)"
            )),
        }
    }
}

// ── Operations ───────────────────────────────────────────────────────────────

/// Reporting operations over the ledger engine: argument assembly on top of
/// the runner, then pure shaping of the decoded payloads.
pub struct Reports {
    runner: HledgerRunner,
    expenses_account: String,
}

impl Reports {
    pub fn new(runner: HledgerRunner, expenses_account: impl Into<String>) -> Self {
        Reports {
            runner,
            expenses_account: expenses_account.into(),
        }
    }

    /// Per-month spend by category plus whole-period category shares.
    pub async fn spending_breakdown(
        &self,
        period: Option<&str>,
        depth: u32,
        category: Option<&str>,
    ) -> Result<SpendingBreakdown, LedgerError> {
        let account = match category {
            Some(c) => format!("{}:{}", self.expenses_account, c),
            None => self.expenses_account.clone(),
        };
        let depth = depth.to_string();
        let mut args = vec!["bal", account.as_str(), "--depth", depth.as_str()];
        push_period(&mut args, period);
        args.extend_from_slice(&["-M", "-S"]);
        let report: PeriodicReport = self.runner.run_json(&args).await?;
        Ok(breakdown_from(
            &report,
            &self.expenses_account,
            period_label(period),
        ))
    }

    /// Income, expenses and net per weekly, monthly or quarterly bucket.
    pub async fn financial_trends(
        &self,
        period: Option<&str>,
        interval: Interval,
    ) -> Result<TrendsResult, LedgerError> {
        let mut args = vec!["is", interval.flag()];
        push_period(&mut args, period);
        let report: CompoundReport = self.runner.run_json(&args).await?;
        Ok(trends_from(&report))
    }

    /// Net worth, totals, savings rate and the top expense categories.
    pub async fn financial_summary(
        &self,
        period: Option<&str>,
    ) -> Result<FinancialSummary, LedgerError> {
        let mut bs_args = vec!["bs"];
        push_period(&mut bs_args, period);
        let balance_sheet: CompoundReport = self.runner.run_json(&bs_args).await?;

        let mut is_args = vec!["is"];
        push_period(&mut is_args, period);
        let income_statement: CompoundReport = self.runner.run_json(&is_args).await?;

        let mut top_args = vec!["bal", self.expenses_account.as_str(), "--depth", "2"];
        push_period(&mut top_args, period);
        top_args.push("-S");
        let top: FlatBalance = self.runner.run_json(&top_args).await?;

        Ok(summary_from(
            &balance_sheet,
            &income_statement,
            &top,
            &self.expenses_account,
        ))
    }

    /// Assets, liabilities and net worth per month.
    pub async fn net_worth_timeline(
        &self,
        period: Option<&str>,
    ) -> Result<NetWorthTimeline, LedgerError> {
        let mut args = vec!["bs", "-M"];
        push_period(&mut args, period);
        let report: CompoundReport = self.runner.run_json(&args).await?;
        Ok(timeline_from(&report))
    }

    /// Register search; returns the last `limit` matches plus the full
    /// match count.
    pub async fn transaction_search(
        &self,
        account: Option<&str>,
        query: Option<&str>,
        period: Option<&str>,
        limit: usize,
    ) -> Result<TransactionSearch, LedgerError> {
        let mut args: Vec<String> = vec!["register".to_string()];
        let mut shown: Vec<String> = Vec::new();
        if let Some(a) = account {
            args.push(a.to_string());
            shown.push(a.to_string());
        }
        if let Some(q) = query {
            args.push(format!("desc:{q}"));
            shown.push(format!("desc:\"{q}\""));
        }
        if let Some(p) = period {
            args.push("-p".to_string());
            args.push(p.to_string());
            shown.push(format!("-p \"{p}\""));
        }
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let rows: Vec<RegisterRow> = self.runner.run_json(&arg_refs).await?;
        Ok(search_from(rows, limit, shown.join(" ")))
    }

    /// The full register as domain postings, for the recurrence detector.
    pub async fn register_postings(
        &self,
        period: Option<&str>,
    ) -> Result<Vec<Posting>, LedgerError> {
        let mut args = vec!["register"];
        push_period(&mut args, period);
        let rows: Vec<RegisterRow> = self.runner.run_json(&args).await?;
        Ok(rows
            .into_iter()
            .map(|(date, _, description, posting, _)| Posting {
                date,
                description,
                account: posting.paccount,
                amount: cell_amount(&posting.pamount),
            })
            .collect())
    }

    /// Monthly expense table by category, for the anomaly detector.
    pub async fn monthly_spend_rows(
        &self,
        period: Option<&str>,
    ) -> Result<Vec<MonthlySpendRow>, LedgerError> {
        let mut args = vec!["bal", self.expenses_account.as_str(), "--depth", "2"];
        push_period(&mut args, period);
        args.push("-M");
        let report: PeriodicReport = self.runner.run_json(&args).await?;
        Ok(spend_rows_from(&report, &self.expenses_account))
    }

    /// Category list, transaction count, recorded date span and suggested
    /// query periods.
    pub async fn data_info(&self) -> Result<DataInfo, LedgerError> {
        let accounts = self
            .runner
            .run(&["accounts", self.expenses_account.as_str(), "--depth", "2"])
            .await?;
        let stats = self.runner.run(&["stats"]).await?;
        Ok(info_from(&accounts, &stats, &self.expenses_account))
    }

    /// Actual versus budgeted spend per category and month. Categories with
    /// no budget goal are omitted.
    pub async fn budget_comparison(
        &self,
        period: Option<&str>,
        depth: u32,
    ) -> Result<BudgetComparison, LedgerError> {
        let depth = depth.to_string();
        let mut args = vec![
            "bal",
            self.expenses_account.as_str(),
            "--budget",
            "--depth",
            depth.as_str(),
        ];
        push_period(&mut args, period);
        args.push("-M");
        let report: BudgetReport = self.runner.run_json(&args).await?;
        Ok(budget_from(
            &report,
            &self.expenses_account,
            period_label(period),
        ))
    }
}

fn push_period<'a>(args: &mut Vec<&'a str>, period: Option<&'a str>) {
    if let Some(p) = period {
        args.extend_from_slice(&["-p", p]);
    }
}

fn period_label(period: Option<&str>) -> String {
    period.unwrap_or("all time").to_string()
}

/// Account name with the configured expenses root stripped.
fn category_name(account: &str, prefix: &str) -> String {
    account
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix(':'))
        .unwrap_or(account)
        .to_string()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ── Shaping ──────────────────────────────────────────────────────────────────

fn breakdown_from(report: &PeriodicReport, prefix: &str, period: String) -> SpendingBreakdown {
    let labels = month_labels(&report.dates);

    let months = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let mut categories: Vec<CategoryAmount> = report
                .rows
                .iter()
                .filter_map(|row| {
                    let amount = row.amount_at(i).abs();
                    (!amount.is_zero()).then(|| CategoryAmount {
                        name: category_name(&row.name, prefix),
                        amount,
                    })
                })
                .collect();
            categories.sort_by(|a, b| b.amount.cmp(&a.amount));
            let total = categories.iter().map(|c| c.amount).sum();
            MonthSpending {
                date: label.clone(),
                categories,
                total,
            }
        })
        .collect();

    let grand_total = cell_amount(&report.totals.total).abs();
    let mut category_totals: Vec<CategoryShare> = report
        .rows
        .iter()
        .filter_map(|row| {
            let amount = row.total_amount().abs();
            (!amount.is_zero()).then(|| CategoryShare {
                name: category_name(&row.name, prefix),
                percentage: share_percentage(amount, grand_total),
                amount,
            })
        })
        .collect();
    category_totals.sort_by(|a, b| b.amount.cmp(&a.amount));

    SpendingBreakdown {
        months,
        category_totals,
        grand_total,
        period,
    }
}

fn share_percentage(amount: Amount, grand_total: Amount) -> f64 {
    if grand_total.is_zero() {
        return 0.0;
    }
    let ratio = (amount.as_decimal() / grand_total.as_decimal()) * Decimal::from(100);
    round2(ratio.to_f64().unwrap_or(0.0))
}

fn trends_from(report: &CompoundReport) -> TrendsResult {
    let labels = month_labels(&report.dates);
    let income_report = report.subreport(0);
    let expense_report = report.subreport(1);

    let periods = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let income = column_total(income_report, i).abs();
            let expenses = column_total(expense_report, i).abs();
            PeriodTrend {
                date: label.clone(),
                income,
                expenses,
                net: income - expenses,
            }
        })
        .collect();

    TrendsResult { periods }
}

fn column_total(report: Option<&PeriodicReport>, index: usize) -> Amount {
    report
        .map(|r| r.rows.iter().map(|row| row.amount_at(index)).sum())
        .unwrap_or_else(Amount::zero)
}

fn summary_from(
    balance_sheet: &CompoundReport,
    income_statement: &CompoundReport,
    top: &FlatBalance,
    prefix: &str,
) -> FinancialSummary {
    let net_worth = cell_amount(&balance_sheet.totals.total);
    let total_income = subreport_total(income_statement, 0);
    let total_expenses = subreport_total(income_statement, 1);

    let savings_rate = if total_income.is_zero() {
        0.0
    } else {
        let ratio = ((total_income - total_expenses).as_decimal() / total_income.as_decimal())
            * Decimal::from(100);
        round2(ratio.to_f64().unwrap_or(0.0))
    };

    let top_expenses = top
        .0
        .iter()
        .take(5)
        .map(|(name, _, _, amounts)| CategoryAmount {
            name: category_name(name, prefix),
            amount: cell_amount(amounts).abs(),
        })
        .collect();

    FinancialSummary {
        net_worth,
        total_income,
        total_expenses,
        savings_rate,
        cashflow: total_income - total_expenses,
        top_expenses,
    }
}

fn subreport_total(report: &CompoundReport, index: usize) -> Amount {
    report
        .subreport(index)
        .map(|r| cell_amount(&r.totals.total).abs())
        .unwrap_or_else(Amount::zero)
}

fn timeline_from(report: &CompoundReport) -> NetWorthTimeline {
    let labels = month_labels(&report.dates);
    let assets_report = report.subreport(0);
    let liabilities_report = report.subreport(1);

    let points = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let assets = column_total(assets_report, i);
            let liabilities = column_total(liabilities_report, i).abs();
            NetWorthPoint {
                date: label.clone(),
                assets,
                liabilities,
                net_worth: assets - liabilities,
            }
        })
        .collect();

    NetWorthTimeline { points }
}

fn search_from(rows: Vec<RegisterRow>, limit: usize, query: String) -> TransactionSearch {
    let count = rows.len();
    let skip = count.saturating_sub(limit);
    let transactions = rows
        .into_iter()
        .skip(skip)
        .map(|(date, _, description, posting, _)| SearchHit {
            date,
            description,
            account: posting.paccount,
            amount: cell_amount(&posting.pamount),
        })
        .collect();
    TransactionSearch {
        transactions,
        count,
        query,
    }
}

fn spend_rows_from(report: &PeriodicReport, prefix: &str) -> Vec<MonthlySpendRow> {
    let labels = month_labels(&report.dates);
    report
        .rows
        .iter()
        .map(|row| MonthlySpendRow {
            category: category_name(&row.name, prefix),
            months: labels
                .iter()
                .enumerate()
                .map(|(i, label)| (label.clone(), row.amount_at(i).abs()))
                .collect(),
        })
        .collect()
}

re!(re_txn_span, r"Txns span\s*:\s*(\d{4}-\d{2}-\d{2})\s+to\s+(\d{4}-\d{2}-\d{2})");
re!(re_txn_count, r"(?m)^Txns\s*:\s*(\d+)");

fn info_from(accounts_text: &str, stats_text: &str, prefix: &str) -> DataInfo {
    let categories = accounts_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| category_name(line, prefix))
        .collect();

    let date_range = re_txn_span().captures(stats_text).and_then(|c| {
        let start = NaiveDate::parse_from_str(&c[1], "%Y-%m-%d").ok()?;
        let end = NaiveDate::parse_from_str(&c[2], "%Y-%m-%d").ok()?;
        Some(DateRange::new(start, end))
    });

    let transaction_count = re_txn_count()
        .captures(stats_text)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0);

    DataInfo {
        categories,
        date_range,
        transaction_count,
        suggested_periods: suggested_periods(date_range),
    }
}

/// Query periods worth offering for the recorded span: the whole span, the
/// latest year, the year before, and each quarter of the latest year the
/// span touches.
fn suggested_periods(range: Option<DateRange>) -> Vec<SuggestedPeriod> {
    let Some(range) = range else {
        return Vec::new();
    };
    let year = range.end.year();
    let mut periods = vec![
        SuggestedPeriod {
            label: "All time".to_string(),
            value: format!("{}..{}", range.start, range.end),
        },
        SuggestedPeriod {
            label: format!("This year ({year})"),
            value: year.to_string(),
        },
        SuggestedPeriod {
            label: format!("Last year ({})", year - 1),
            value: (year - 1).to_string(),
        },
    ];
    for quarter in 1u32..=4 {
        let Some(start) = NaiveDate::from_ymd_opt(year, (quarter - 1) * 3 + 1, 1) else {
            continue;
        };
        let end_exclusive = if quarter == 4 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, quarter * 3 + 1, 1)
        };
        let Some(end) = end_exclusive.and_then(|d| d.pred_opt()) else {
            continue;
        };
        if start <= range.end && end >= range.start {
            periods.push(SuggestedPeriod {
                label: format!("Q{quarter} {year}"),
                value: format!("{year}q{quarter}"),
            });
        }
    }
    periods
}

fn budget_from(report: &BudgetReport, prefix: &str, period: String) -> BudgetComparison {
    let labels = month_labels(&report.dates);

    let categories = report
        .rows
        .iter()
        .filter_map(|row| {
            let (total_actual, total_budget) = budget_cell(&row.total);
            if total_budget.is_zero() {
                return None;
            }
            let periods = labels
                .iter()
                .enumerate()
                .map(|(i, label)| {
                    let (actual, budget) = row.cell_at(i);
                    budget_period(label, actual, budget)
                })
                .collect();
            Some(BudgetCategory {
                name: category_name(&row.name, prefix),
                periods,
                total_percentage: whole_percentage(total_actual, total_budget),
                total_actual,
                total_budget,
            })
        })
        .collect();

    let totals = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let (actual, budget) = report
                .totals
                .amounts
                .get(i)
                .map(budget_cell)
                .unwrap_or_else(|| (Amount::zero(), Amount::zero()));
            budget_period(label, actual, budget)
        })
        .collect();

    BudgetComparison {
        categories,
        totals,
        period,
    }
}

fn budget_period(label: &str, actual: Amount, budget: Amount) -> BudgetPeriod {
    BudgetPeriod {
        date: label.to_string(),
        percentage: whole_percentage(actual, budget),
        actual,
        budget,
    }
}

/// Whole-percent spend-to-goal ratio; a missing goal reads 0.
fn whole_percentage(actual: Amount, budget: Amount) -> i64 {
    if budget.is_zero() {
        return 0;
    }
    ((actual.as_decimal() / budget.as_decimal()) * Decimal::from(100))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}
