//! Session summary persistence: the interchange record, a local history
//! file, a remote HTTP endpoint and a background persister that keeps
//! saving off the frame loop.

pub mod error;
pub mod fallback;
pub mod history;
pub mod persister;
pub mod remote;
pub mod summary;

pub use error::StoreError;
pub use fallback::Fallback;
pub use history::{HistoryFile, DEFAULT_HISTORY_LIMIT};
pub use persister::{MemoryStore, Persister, SummarySink, SummaryStore};
pub use remote::HttpEndpoint;
pub use summary::{session_id, RepCounts, SessionSummary};
