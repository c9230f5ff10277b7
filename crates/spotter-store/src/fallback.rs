use crate::{SessionSummary, StoreError, SummaryStore};

/// Saves to `primary`; when that fails, logs and saves to `secondary`.
///
/// Typical use is a remote endpoint backed by a local history file.
#[derive(Debug, Clone)]
pub struct Fallback<P, S> {
    primary: P,
    secondary: S,
}

impl<P, S> Fallback<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

impl<P: SummaryStore + Sync, S: SummaryStore + Sync> SummaryStore for Fallback<P, S> {
    async fn save(&self, summary: &SessionSummary) -> Result<(), StoreError> {
        match self.primary.save(summary).await {
            Ok(()) => Ok(()),
            Err(e) => {
                log::warn!(
                    "primary store failed for session {}: {}, using fallback",
                    summary.session_id,
                    e
                );
                self.secondary.save(summary).await
            }
        }
    }
}
