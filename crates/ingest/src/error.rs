use thiserror::Error;

/// Structural problems in the input text itself.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("CSV must have a header row and at least one data row")]
    TooFewRows,
    #[error("Cannot parse date: \"{0}\"")]
    BadDate(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// The input was well-formed but the column mapping could not be settled.
/// Carries the headers seen so the caller can supply an explicit mapping.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not detect date and description columns; headers seen: {}", .0.join(", "))]
    DetectionFailed(Vec<String>),
    #[error("{role} column \"{column}\" does not exist; headers seen: {}", .headers.join(", "))]
    MissingColumn {
        role: &'static str,
        column: String,
        headers: Vec<String>,
    },
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
