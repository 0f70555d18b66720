use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::error::LedgerError;

/// First line written when the uploaded journal is created.
const UPLOAD_BANNER: &str = "; Uploaded transactions\n\n";

/// The journal file this tool owns. Imported entries are appended here; the
/// base journal is never written.
#[derive(Debug, Clone)]
pub struct JournalStore {
    path: PathBuf,
}

/// One description whose unknown-category postings should move to a real
/// account.
#[derive(Debug, Clone)]
pub struct CategoryMapping {
    pub description: String,
    pub new_account: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecategorizeOutcome {
    pub updated: usize,
    pub unchanged: usize,
}

impl JournalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JournalStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The journal text, or empty when the file does not exist yet.
    pub async fn read(&self) -> Result<String, LedgerError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Appends rendered journal entries, creating the file with its banner
    /// on first write.
    pub async fn append(&self, entries: &str) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let fresh = !tokio::fs::try_exists(&self.path).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        if fresh {
            file.write_all(UPLOAD_BANNER.as_bytes()).await?;
        }
        file.write_all(entries.as_bytes()).await?;
        file.flush().await?;
        tracing::info!(path = %self.path.display(), bytes = entries.len(), "appended to uploaded journal");
        Ok(())
    }

    /// Rewrites `expenses:unknown` to each mapping's account wherever an
    /// entry header carries the mapped description, case-insensitively.
    /// Counts a mapping as updated when it changed at least one entry. The
    /// file is replaced through a rename so a crash cannot leave it half
    /// written.
    pub async fn recategorize(
        &self,
        mappings: &[CategoryMapping],
    ) -> Result<RecategorizeOutcome, LedgerError> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(RecategorizeOutcome {
                updated: 0,
                unchanged: 0,
            });
        }

        let mut content = tokio::fs::read_to_string(&self.path).await?;
        let mut updated = 0;
        for mapping in mappings {
            let matcher = Regex::new(&format!(
                r"(?i)(\d{{4}}-\d{{2}}-\d{{2}}\s+{}[^\n]*\n\s+)expenses:unknown",
                regex::escape(&mapping.description)
            ))
            .expect("invalid regex");
            if matcher.is_match(&content) {
                content = matcher
                    .replace_all(&content, |caps: &regex::Captures| {
                        format!("{}{}", &caps[1], mapping.new_account)
                    })
                    .into_owned();
                updated += 1;
            }
        }

        if updated > 0 {
            let tmp = self.path.with_extension("tmp");
            tokio::fs::write(&tmp, &content).await?;
            tokio::fs::rename(&tmp, &self.path).await?;
            tracing::info!(path = %self.path.display(), updated, "recategorized journal entries");
        }

        Ok(RecategorizeOutcome {
            updated,
            unchanged: mappings.len() - updated,
        })
    }
}
