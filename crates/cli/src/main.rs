use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use quid_analytics::{
    detect_anomalies, detect_recurring, Anomaly, AnomalyConfig, CategorySeries, MonthlyAmount,
    RecurringConfig,
};
use quid_ingest::{ColumnMapping, DedupIndex, ImportPreview};
use quid_ledger::{
    CategoryMapping, DetectionSettings, EngineConfig, HledgerRunner, Interval, JournalStore,
    Reports,
};

#[derive(Parser, Debug)]
#[command(
    name = "quid",
    version,
    about = "CSV import and spending insight over an hledger journal"
)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base journal path, overriding the config
    #[arg(long, global = true)]
    journal: Option<PathBuf>,

    /// Uploaded journal path, overriding the config
    #[arg(long, global = true)]
    uploaded: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a CSV and show what an import would add, without writing
    Preview {
        /// CSV file to read (stdin when omitted)
        csv: Option<PathBuf>,

        #[command(flatten)]
        columns: ColumnFlags,
    },

    /// Parse a CSV and append the new transactions to the uploaded journal
    Import {
        /// CSV file to read (stdin when omitted)
        csv: Option<PathBuf>,

        #[command(flatten)]
        columns: ColumnFlags,
    },

    /// Detect subscriptions and other charges that repeat on a cadence
    Recurring {
        /// Minimum occurrences before a description group is considered
        #[arg(long)]
        min_occurrences: Option<usize>,
    },

    /// Flag months whose category spend sits far from that category's average
    Anomalies {
        /// Period filter, e.g. 2025, 2025q3 or 2025-01..2025-06
        #[arg(long)]
        period: Option<String>,
    },

    /// Monthly spending by category
    Breakdown {
        /// Period filter, e.g. 2025, 2025q3 or 2025-01..2025-06
        #[arg(long)]
        period: Option<String>,

        /// Account depth for category grouping
        #[arg(long, default_value_t = 2)]
        depth: u32,

        /// Restrict to one category under the expenses root
        #[arg(long)]
        category: Option<String>,
    },

    /// Income, expenses and net per time bucket
    Trends {
        /// Period filter, e.g. 2025, 2025q3 or 2025-01..2025-06
        #[arg(long)]
        period: Option<String>,

        /// Bucket size: weekly, monthly or quarterly
        #[arg(long, default_value = "monthly")]
        interval: Interval,
    },

    /// Net worth, income, expenses, savings rate and top expense categories
    Summary {
        /// Period filter, e.g. 2025, 2025q3 or 2025-01..2025-06
        #[arg(long)]
        period: Option<String>,
    },

    /// Month-end assets, liabilities and net worth
    Networth {
        /// Period filter, e.g. 2025, 2025q3 or 2025-01..2025-06
        #[arg(long)]
        period: Option<String>,
    },

    /// Search register postings by account and description
    Search {
        /// Account filter, e.g. expenses:food
        account: Option<String>,

        /// Case-insensitive description filter
        #[arg(long)]
        query: Option<String>,

        /// Period filter, e.g. 2025, 2025q3 or 2025-01..2025-06
        #[arg(long)]
        period: Option<String>,

        /// How many of the most recent matches to return
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },

    /// Budgeted versus actual spending per category and month
    Budget {
        /// Period filter, e.g. 2025, 2025q3 or 2025-01..2025-06
        #[arg(long)]
        period: Option<String>,

        /// Account depth for category grouping
        #[arg(long, default_value_t = 2)]
        depth: u32,
    },

    /// Categories, transaction count, date span and suggested query periods
    Info,

    /// Move uploaded transactions matching a description out of expenses:unknown
    Recategorize {
        /// Transaction description to match, case-insensitively
        description: String,

        /// Replacement account, e.g. expenses:food:takeaway
        new_account: String,
    },
}

/// Manual column mapping. Leaving every flag unset selects header
/// auto-detection; setting any makes date and description mandatory plus
/// at least one amount source.
#[derive(Args, Debug)]
struct ColumnFlags {
    /// Header carrying the transaction date
    #[arg(long)]
    date_col: Option<String>,

    /// Header carrying the description
    #[arg(long)]
    desc_col: Option<String>,

    /// Header carrying a single signed amount
    #[arg(long)]
    amount_col: Option<String>,

    /// Header carrying debits when amounts are split over two columns
    #[arg(long)]
    debit_col: Option<String>,

    /// Header carrying credits when amounts are split over two columns
    #[arg(long)]
    credit_col: Option<String>,
}

impl ColumnFlags {
    fn mapping(self) -> Result<Option<ColumnMapping>> {
        let any = self.date_col.is_some()
            || self.desc_col.is_some()
            || self.amount_col.is_some()
            || self.debit_col.is_some()
            || self.credit_col.is_some();
        if !any {
            return Ok(None);
        }
        let Some(date) = self.date_col else {
            bail!("--date-col is required when mapping columns manually");
        };
        let Some(description) = self.desc_col else {
            bail!("--desc-col is required when mapping columns manually");
        };
        if self.amount_col.is_none() && self.debit_col.is_none() && self.credit_col.is_none() {
            bail!("name an amount source: --amount-col, or --debit-col/--credit-col");
        }
        Ok(Some(ColumnMapping {
            date,
            description,
            amount: self.amount_col,
            debit: self.debit_col,
            credit: self.credit_col,
        }))
    }
}

/// Envelope for the anomalies command, echoing the period the monthly
/// table was built over.
#[derive(Debug, Serialize)]
struct AnomalyReport {
    anomalies: Vec<Anomaly>,
    period: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = EngineConfig::load(cli.config.as_deref()).context("loading config")?;
    if let Some(path) = cli.journal {
        config.base_journal = path;
    }
    if let Some(path) = cli.uploaded {
        config.uploaded_journal = path;
    }
    tracing::debug!(
        base = %config.base_journal.display(),
        uploaded = %config.uploaded_journal.display(),
        "journals resolved"
    );

    match cli.command {
        Command::Preview { csv, columns } => {
            let mapping = columns.mapping()?;
            let raw = read_csv_input(csv.as_deref())?;
            let preview = build_preview(&config, &raw, mapping)?;
            print_json(&preview)
        }

        Command::Import { csv, columns } => {
            let mapping = columns.mapping()?;
            let raw = read_csv_input(csv.as_deref())?;
            let preview = build_preview(&config, &raw, mapping)?;
            let result = run_import(&config, preview).await?;
            print_json(&result)
        }

        Command::Recurring { min_occurrences } => {
            let postings = reports(&config).register_postings(None).await?;
            let mut detector = recurring_config(&config.detection);
            if let Some(n) = min_occurrences {
                detector.min_occurrences = n;
            }
            print_json(&detect_recurring(&postings, &detector))
        }

        Command::Anomalies { period } => {
            let rows = reports(&config)
                .monthly_spend_rows(period.as_deref())
                .await?;
            let series: Vec<CategorySeries> = rows
                .into_iter()
                .map(|row| CategorySeries {
                    category: row.category,
                    points: row
                        .months
                        .into_iter()
                        .map(|(month, amount)| MonthlyAmount { month, amount })
                        .collect(),
                })
                .collect();
            let anomalies = detect_anomalies(&series, &anomaly_config(&config.detection));
            print_json(&AnomalyReport {
                anomalies,
                period: period.unwrap_or_else(|| "all time".to_string()),
            })
        }

        Command::Breakdown {
            period,
            depth,
            category,
        } => {
            let breakdown = reports(&config)
                .spending_breakdown(period.as_deref(), depth, category.as_deref())
                .await?;
            print_json(&breakdown)
        }

        Command::Trends { period, interval } => {
            let trends = reports(&config)
                .financial_trends(period.as_deref(), interval)
                .await?;
            print_json(&trends)
        }

        Command::Summary { period } => {
            let summary = reports(&config).financial_summary(period.as_deref()).await?;
            print_json(&summary)
        }

        Command::Networth { period } => {
            let timeline = reports(&config)
                .net_worth_timeline(period.as_deref())
                .await?;
            print_json(&timeline)
        }

        Command::Search {
            account,
            query,
            period,
            limit,
        } => {
            let result = reports(&config)
                .transaction_search(
                    account.as_deref(),
                    query.as_deref(),
                    period.as_deref(),
                    limit,
                )
                .await?;
            print_json(&result)
        }

        Command::Budget { period, depth } => {
            let comparison = reports(&config)
                .budget_comparison(period.as_deref(), depth)
                .await?;
            print_json(&comparison)
        }

        Command::Info => {
            let info = reports(&config).data_info().await?;
            print_json(&info)
        }

        Command::Recategorize {
            description,
            new_account,
        } => {
            let store = JournalStore::new(&config.uploaded_journal);
            let outcome = store
                .recategorize(&[CategoryMapping {
                    description,
                    new_account,
                }])
                .await?;
            print_json(&outcome)
        }
    }
}

// ── Composition helpers ──────────────────────────────────────────────────────

fn reports(config: &EngineConfig) -> Reports {
    Reports::new(
        HledgerRunner::from_config(config),
        config.expenses_account.clone(),
    )
}

fn recurring_config(settings: &DetectionSettings) -> RecurringConfig {
    RecurringConfig {
        min_occurrences: settings.min_occurrences,
        max_gap_cv: settings.max_gap_cv,
        recent_amounts: settings.recent_amounts,
    }
}

fn anomaly_config(settings: &DetectionSettings) -> AnomalyConfig {
    AnomalyConfig {
        min_months: settings.min_months,
        flag_z: settings.flag_z,
        high_z: settings.high_z,
    }
}

fn read_csv_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) => {
            std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))
        }
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("reading CSV from stdin")?;
            Ok(raw)
        }
    }
}

/// A journal that does not exist yet deduplicates against nothing.
fn read_journal(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}

fn build_preview(
    config: &EngineConfig,
    raw: &str,
    mapping: Option<ColumnMapping>,
) -> Result<ImportPreview> {
    let base = read_journal(&config.base_journal)?;
    let uploaded = read_journal(&config.uploaded_journal)?;
    let index = DedupIndex::from_journal(&format!("{base}\n{uploaded}"), &config.currency);
    Ok(quid_ingest::preview(raw, mapping, &index)?)
}

/// Appends the previewed batch to the uploaded journal. A batch with nothing
/// new writes nothing and still reports success.
async fn run_import(config: &EngineConfig, preview: ImportPreview) -> Result<ImportPreview> {
    if preview.transactions.is_empty() {
        return Ok(preview.into_imported());
    }
    let entries = quid_ingest::render_journal(
        &preview.transactions,
        &config.currency,
        chrono::Utc::now().naive_utc(),
    );
    JournalStore::new(&config.uploaded_journal)
        .append(&entries)
        .await?;
    Ok(preview.into_imported())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
