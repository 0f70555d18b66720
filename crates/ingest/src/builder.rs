use serde::Serialize;

use quid_core::{Amount, DateRange, Transaction};

use crate::dedup::DedupIndex;
use crate::error::{ImportError, ParseError};
use crate::normalize::{parse_amount, parse_date, resolve_split};
use crate::schema::{self, ColumnMapping, ResolvedColumns};
use crate::tokenizer::{cell, tokenize, RawTable};

/// How many pre-dedup rows the preview carries for display.
pub const SAMPLE_ROWS: usize = 5;

/// Result of one preview or import run. Totals and the date range cover the
/// deduplicated set; `sample` shows the head of the parsed batch before
/// dedup so the caller can sanity-check the column mapping.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreview {
    pub imported: bool,
    pub count: usize,
    pub skipped_duplicates: usize,
    pub date_range: Option<DateRange>,
    pub total_expenses: Amount,
    pub total_income: Amount,
    pub mapping: ColumnMapping,
    pub headers: Vec<String>,
    pub sample: Vec<Transaction>,
    pub transactions: Vec<Transaction>,
}

impl ImportPreview {
    pub fn into_imported(self) -> Self {
        ImportPreview {
            imported: true,
            ..self
        }
    }
}

fn build_transactions(
    table: &RawTable,
    cols: &ResolvedColumns,
) -> Result<Vec<Transaction>, ParseError> {
    let mut transactions = Vec::new();
    for row in &table.rows {
        let date = parse_date(cell(row, cols.date))?;

        let description = match cell(row, cols.description) {
            "" => "Unknown".to_string(),
            s => s.to_string(),
        };

        let amount = match cols.amount {
            Some(idx) => parse_amount(cell(row, idx)),
            None => {
                let debit = cols
                    .debit
                    .map(|i| parse_amount(cell(row, i)))
                    .unwrap_or_else(Amount::zero);
                let credit = cols
                    .credit
                    .map(|i| parse_amount(cell(row, i)))
                    .unwrap_or_else(Amount::zero);
                resolve_split(debit, credit)
            }
        };
        // A zero amount means an empty or unparsable cell; the row carries
        // no economic event.
        if amount.is_zero() {
            continue;
        }

        transactions.push(Transaction::new(date, description, amount));
    }

    transactions.sort_by_key(|t| t.date);
    Ok(transactions)
}

/// Runs the full ingestion pipeline against one CSV text: tokenize, map
/// columns (auto-detected unless `manual` is given), normalize, drop
/// degenerate rows, and suppress entries already in the journal index.
pub fn preview(
    raw: &str,
    manual: Option<ColumnMapping>,
    index: &DedupIndex,
) -> Result<ImportPreview, ImportError> {
    let table = tokenize(raw)?;

    let mapping = match manual {
        Some(m) => m,
        None => schema::detect(&table.headers)?,
    };
    let cols = mapping.resolve(&table.headers)?;

    let transactions = build_transactions(&table, &cols)?;
    let sample: Vec<Transaction> = transactions.iter().take(SAMPLE_ROWS).cloned().collect();

    let (kept, skipped) = index.filter_new(transactions);

    let dates: Vec<_> = kept.iter().map(|t| t.date).collect();
    let total_expenses: Amount = kept
        .iter()
        .filter(|t| t.amount.is_expense())
        .map(|t| t.amount)
        .sum();
    let total_income: Amount = kept
        .iter()
        .filter(|t| t.amount.is_income())
        .map(|t| t.amount)
        .sum::<Amount>()
        .abs();

    Ok(ImportPreview {
        imported: false,
        count: kept.len(),
        skipped_duplicates: skipped,
        date_range: DateRange::spanning(&dates),
        total_expenses,
        total_income,
        mapping,
        headers: table.headers,
        sample,
        transactions: kept,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn empty_index() -> DedupIndex {
        DedupIndex::from_journal("", "£")
    }

    #[test]
    fn two_row_statement_end_to_end() {
        let csv = "Date,Description,Amount\n01/04/2025,Tesco,45.80\n02/04/2025,Salary,-2000.00\n";
        let p = preview(csv, None, &empty_index()).unwrap();
        assert!(!p.imported);
        assert_eq!(p.count, 2);
        assert_eq!(p.skipped_duplicates, 0);
        let range = p.date_range.unwrap();
        assert_eq!(range.start, d(2025, 4, 1));
        assert_eq!(range.end, d(2025, 4, 2));
        assert_eq!(p.total_expenses, Amount::from_cents(4580));
        assert_eq!(p.total_income, Amount::from_cents(200000));
        assert_eq!(p.transactions[0].description, "Tesco");
        assert_eq!(p.transactions[1].amount, Amount::from_cents(-200000));
    }

    #[test]
    fn rows_sort_by_date() {
        let csv = "Date,Description,Amount\n03/04/2025,C,3.00\n01/04/2025,A,1.00\n02/04/2025,B,2.00\n";
        let p = preview(csv, None, &empty_index()).unwrap();
        let dates: Vec<_> = p.transactions.iter().map(|t| t.date).collect();
        assert_eq!(dates, vec![d(2025, 4, 1), d(2025, 4, 2), d(2025, 4, 3)]);
    }

    #[test]
    fn zero_amount_rows_are_discarded() {
        let csv = "Date,Description,Amount\n01/04/2025,Fee waived,\n02/04/2025,Tesco,45.80\n01/04/2025,Rounding,0.00\n";
        let p = preview(csv, None, &empty_index()).unwrap();
        assert_eq!(p.count, 1);
        assert_eq!(p.transactions[0].description, "Tesco");
    }

    #[test]
    fn split_columns_resolve_signs() {
        let csv = "Date,Narrative,Debit,Credit\n01/04/2025,Rent,850.00,\n02/04/2025,Salary,,2000.00\n";
        let p = preview(csv, None, &empty_index()).unwrap();
        assert_eq!(p.transactions[0].amount, Amount::from_cents(85000));
        assert_eq!(p.transactions[1].amount, Amount::from_cents(-200000));
    }

    #[test]
    fn blank_description_reads_unknown() {
        let csv = "Date,Description,Amount\n01/04/2025,,45.80\n";
        let p = preview(csv, None, &empty_index()).unwrap();
        assert_eq!(p.transactions[0].description, "Unknown");
    }

    #[test]
    fn unparsable_date_fails_whole_batch() {
        let csv = "Date,Description,Amount\n01/04/2025,Tesco,45.80\nsoon,Asda,12.00\n";
        let err = preview(csv, None, &empty_index()).unwrap_err();
        assert!(err.to_string().contains("soon"));
    }

    #[test]
    fn manual_mapping_overrides_detection() {
        let csv = "When,What,How Much\n01/04/2025,Tesco,45.80\n";
        let manual = ColumnMapping {
            date: "When".to_string(),
            description: "What".to_string(),
            amount: Some("How Much".to_string()),
            debit: None,
            credit: None,
        };
        let p = preview(csv, Some(manual), &empty_index()).unwrap();
        assert_eq!(p.count, 1);
        assert_eq!(p.transactions[0].description, "Tesco");
    }

    #[test]
    fn manual_mapping_with_unknown_header_errors() {
        let csv = "When,What,How Much\n01/04/2025,Tesco,45.80\n";
        let manual = ColumnMapping {
            date: "When".to_string(),
            description: "Missing".to_string(),
            amount: Some("How Much".to_string()),
            debit: None,
            credit: None,
        };
        let err = preview(csv, Some(manual), &empty_index()).unwrap_err();
        assert!(err.to_string().contains("Missing"));
        assert!(err.to_string().contains("When, What, How Much"));
    }

    #[test]
    fn sample_shows_prededup_head() {
        let journal = "2025-04-01 Tesco\n    expenses:unknown    £45.80\n    assets:bank:checking\n";
        let index = DedupIndex::from_journal(journal, "£");
        let csv = "Date,Description,Amount\n01/04/2025,Tesco,45.80\n02/04/2025,Asda,12.00\n";
        let p = preview(csv, None, &index).unwrap();
        assert_eq!(p.count, 1);
        assert_eq!(p.skipped_duplicates, 1);
        // The suppressed row still appears in the sample.
        assert_eq!(p.sample.len(), 2);
        assert_eq!(p.sample[0].description, "Tesco");
    }

    #[test]
    fn sample_caps_at_five_rows() {
        let mut csv = String::from("Date,Description,Amount\n");
        for day in 1..=8 {
            csv.push_str(&format!("{:02}/04/2025,Shop {day},1.00\n", day));
        }
        let p = preview(&csv, None, &empty_index()).unwrap();
        assert_eq!(p.sample.len(), SAMPLE_ROWS);
        assert_eq!(p.count, 8);
    }

    #[test]
    fn preview_serializes_camel_case() {
        let csv = "Date,Description,Amount\n01/04/2025,Tesco,45.80\n";
        let p = preview(csv, None, &empty_index()).unwrap();
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["skippedDuplicates"], 0);
        assert_eq!(json["dateRange"]["start"], "2025-04-01");
        assert_eq!(json["totalExpenses"], "45.80");
        assert_eq!(json["imported"], false);
        assert!(json["mapping"]["amount"].is_string());
    }

    #[test]
    fn empty_batch_has_no_date_range() {
        let csv = "Date,Description,Amount\n01/04/2025,Void,0.00\n";
        let p = preview(csv, None, &empty_index()).unwrap();
        assert_eq!(p.count, 0);
        assert!(p.date_range.is_none());
        assert!(p.total_expenses.is_zero());
    }
}
