use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger binary not found at {0}: install hledger or set `binary` in the config")]
    BinaryNotFound(PathBuf),
    #[error("ledger command failed (exit {code}): {stderr}")]
    CommandFailed { code: i32, stderr: String },
    #[error("ledger command timed out after {0}s")]
    Timeout(u64),
    #[error("malformed report payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid config file: {0}")]
    Config(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
