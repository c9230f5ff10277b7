use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{SessionSummary, StoreError};

/// A durable destination for session summaries.
pub trait SummaryStore {
    fn save(
        &self,
        summary: &SessionSummary,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Where a finished session is handed off. Must not block the caller.
pub trait SummarySink {
    fn submit(&mut self, summary: SessionSummary);
}

impl SummarySink for Vec<SessionSummary> {
    fn submit(&mut self, summary: SessionSummary) {
        self.push(summary);
    }
}

/// In-memory store; clones share the same list.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<Vec<SessionSummary>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<SessionSummary> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl SummaryStore for MemoryStore {
    async fn save(&self, summary: &SessionSummary) -> Result<(), StoreError> {
        match self.entries.lock() {
            Ok(mut entries) => entries.push(summary.clone()),
            Err(poisoned) => poisoned.into_inner().push(summary.clone()),
        }
        Ok(())
    }
}

/// Fire-and-forget persistence.
///
/// `submit` queues the summary and returns immediately; a background task
/// saves queued summaries in order. Save failures are logged and never
/// reach the submitter. Must be created inside a tokio runtime.
pub struct Persister {
    tx: Option<mpsc::UnboundedSender<SessionSummary>>,
    task: Option<JoinHandle<usize>>,
}

impl Persister {
    pub fn spawn<S>(store: S) -> Self
    where
        S: SummaryStore + Send + Sync + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<SessionSummary>();

        let task = tokio::spawn(async move {
            let mut saved = 0usize;
            while let Some(summary) = rx.recv().await {
                match store.save(&summary).await {
                    Ok(()) => {
                        saved += 1;
                        log::info!(
                            "saved {} session {} (score {})",
                            summary.exercise_name,
                            summary.session_id,
                            summary.performance_score
                        );
                    }
                    Err(e) => {
                        log::error!("failed to save session {}: {}", summary.session_id, e);
                    }
                }
            }
            saved
        });

        Self {
            tx: Some(tx),
            task: Some(task),
        }
    }

    /// Queue a summary for saving.
    pub fn try_submit(&self, summary: SessionSummary) -> Result<(), StoreError> {
        let tx = self.tx.as_ref().ok_or(StoreError::Closed)?;
        tx.send(summary).map_err(|_| StoreError::Closed)
    }

    /// Stop accepting summaries, wait for the queue to drain and return how
    /// many were saved successfully.
    pub async fn shutdown(mut self) -> Result<usize, StoreError> {
        self.tx.take();
        match self.task.take() {
            Some(task) => task.await.map_err(|e| {
                log::error!("persister task failed: {}", e);
                StoreError::Closed
            }),
            None => Ok(0),
        }
    }
}

impl SummarySink for Persister {
    fn submit(&mut self, summary: SessionSummary) {
        if let Err(e) = self.try_submit(summary) {
            log::error!("dropping session summary: {}", e);
        }
    }
}
