use chrono::NaiveDateTime;

use quid_core::Transaction;

const BALANCING_ACCOUNT: &str = "assets:bank:checking";

/// Renders a batch as journal text: a comment banner, then one entry per
/// transaction. Expenses post to `expenses:unknown`, income to
/// `income:unknown`, awaiting recategorization; the balancing posting
/// carries no amount and is elided by the ledger engine.
pub fn render_journal(transactions: &[Transaction], currency: &str, stamp: NaiveDateTime) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "; Imported from CSV at {}\n",
        stamp.format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str(&format!("; {} transactions\n\n", transactions.len()));

    for tx in transactions {
        let category = if tx.amount.is_expense() {
            "expenses:unknown"
        } else {
            "income:unknown"
        };
        out.push_str(&format!("{} {}\n", tx.date, tx.description));
        out.push_str(&format!(
            "    {}    {}{}\n",
            category,
            currency,
            tx.amount.abs()
        ));
        out.push_str(&format!("    {}\n\n", BALANCING_ACCOUNT));
    }

    out
}
