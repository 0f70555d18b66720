use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::process::Command;

use crate::config::EngineConfig;
use crate::error::LedgerError;

/// Drives the ledger binary. Every invocation reads the base journal plus,
/// when it exists, the uploaded journal, so reports always see imported
/// transactions.
#[derive(Debug, Clone)]
pub struct HledgerRunner {
    binary: PathBuf,
    base_journal: PathBuf,
    uploaded_journal: PathBuf,
    timeout: Duration,
}

impl HledgerRunner {
    pub fn from_config(config: &EngineConfig) -> Self {
        HledgerRunner {
            binary: config
                .binary
                .clone()
                .unwrap_or_else(|| PathBuf::from("hledger")),
            base_journal: config.base_journal.clone(),
            uploaded_journal: config.uploaded_journal.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Runs one ledger command and returns its stdout as text. Non-zero
    /// exits surface the trimmed stderr; a run past the deadline is killed.
    pub async fn run(&self, args: &[&str]) -> Result<String, LedgerError> {
        let mut command = Command::new(&self.binary);
        command.arg("-f").arg(&self.base_journal);
        if self.uploaded_journal.exists() {
            command.arg("-f").arg(&self.uploaded_journal);
        }
        command.args(args);
        command.stdin(Stdio::null());
        command.kill_on_drop(true);

        tracing::debug!(binary = %self.binary.display(), ?args, "running ledger command");

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| LedgerError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => LedgerError::BinaryNotFound(self.binary.clone()),
                _ => LedgerError::Io(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LedgerError::CommandFailed {
                code: output.status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Runs with JSON output selected and decodes the payload.
    pub async fn run_json<T: DeserializeOwned>(&self, args: &[&str]) -> Result<T, LedgerError> {
        let mut with_format = args.to_vec();
        with_format.extend_from_slice(&["-O", "json"]);
        let stdout = self.run(&with_format).await?;
        Ok(serde_json::from_str(&stdout)?)
    }
}
