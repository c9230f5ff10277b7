use std::path::{Path, PathBuf};

use crate::{SessionSummary, StoreError, SummaryStore};

/// Default number of sessions kept in a history file.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Local durable store: a JSON array of the most recent summaries.
///
/// Writes go to a sibling `.tmp` file which is then renamed over the
/// history file, so a crash mid-write leaves the previous history intact.
#[derive(Debug, Clone)]
pub struct HistoryFile {
    path: PathBuf,
    limit: usize,
}

impl HistoryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored summaries, oldest first. A missing file is an empty history.
    pub async fn load(&self) -> Result<Vec<SessionSummary>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn append(&self, summary: &SessionSummary) -> Result<(), StoreError> {
        let mut entries = match self.load().await {
            Ok(entries) => entries,
            Err(StoreError::Json(e)) => {
                log::warn!(
                    "history file {} is corrupt ({}), starting fresh",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        entries.push(summary.clone());
        if entries.len() > self.limit {
            let excess = entries.len() - self.limit;
            entries.drain(..excess);
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_vec_pretty(&entries)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        log::debug!(
            "history {} now holds {} sessions",
            self.path.display(),
            entries.len()
        );
        Ok(())
    }
}

impl SummaryStore for HistoryFile {
    async fn save(&self, summary: &SessionSummary) -> Result<(), StoreError> {
        self.append(summary).await
    }
}
