//! Statement ingestion: tolerant CSV tokenization, header-role detection,
//! date and amount normalization, duplicate suppression against recorded
//! journal text, and journal rendering for the import path.

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static regex::Regex {
            static R: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
            R.get_or_init(|| regex::Regex::new($pat).expect("invalid regex"))
        }
    };
}
pub(crate) use re;

macro_rules! res {
    ($name:ident, $($pat:expr),+ $(,)?) => {
        fn $name() -> &'static [regex::Regex] {
            static R: std::sync::OnceLock<Vec<regex::Regex>> = std::sync::OnceLock::new();
            R.get_or_init(|| vec![$(regex::Regex::new($pat).expect("invalid regex")),+])
        }
    };
}
pub(crate) use res;

pub mod builder;
pub mod dedup;
pub mod error;
pub mod journal;
pub mod normalize;
pub mod schema;
pub mod tokenizer;

pub use builder::{preview, ImportPreview};
pub use dedup::DedupIndex;
pub use error::{ConfigError, ImportError, ParseError};
pub use journal::render_journal;
pub use schema::{detect, ColumnMapping};
pub use tokenizer::{tokenize, RawTable};
