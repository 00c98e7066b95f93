pub mod cache;
pub mod json_history;
pub mod memory;
pub mod record;

pub use cache::HistoryCache;
pub use json_history::JsonHistoryStore;
pub use memory::InMemoryHistoryStore;
pub use record::ChildRecord;

use std::sync::Arc;

use crate::error::Result;
use crate::models::{BookReadingHistory, ChildProfile, ReadingSession};

/// Read/write access to children's reading history.
///
/// The scorer only needs `fetch_history` and `fetch_profile`; the rest
/// feeds logging and analytics.
pub trait HistoryStore: Send + Sync {
    /// All history records for a child. Unknown children yield an empty list.
    fn fetch_history(&self, child_id: &str) -> Result<Vec<BookReadingHistory>>;

    fn fetch_profile(&self, child_id: &str) -> Result<Option<ChildProfile>>;

    /// Logged sessions, oldest first.
    fn fetch_sessions(&self, child_id: &str) -> Result<Vec<ReadingSession>>;

    fn list_children(&self) -> Result<Vec<ChildProfile>>;

    /// Create or replace a child's profile.
    fn save_profile(&self, profile: &ChildProfile) -> Result<()>;

    /// Insert or replace one history record. The child must exist.
    fn save_history(&self, record: &BookReadingHistory) -> Result<()>;

    /// Log a session and return the updated history record.
    fn record_session(&self, session: &ReadingSession) -> Result<BookReadingHistory>;
}

impl<S: HistoryStore + ?Sized> HistoryStore for Arc<S> {
    fn fetch_history(&self, child_id: &str) -> Result<Vec<BookReadingHistory>> {
        (**self).fetch_history(child_id)
    }

    fn fetch_profile(&self, child_id: &str) -> Result<Option<ChildProfile>> {
        (**self).fetch_profile(child_id)
    }

    fn fetch_sessions(&self, child_id: &str) -> Result<Vec<ReadingSession>> {
        (**self).fetch_sessions(child_id)
    }

    fn list_children(&self) -> Result<Vec<ChildProfile>> {
        (**self).list_children()
    }

    fn save_profile(&self, profile: &ChildProfile) -> Result<()> {
        (**self).save_profile(profile)
    }

    fn save_history(&self, record: &BookReadingHistory) -> Result<()> {
        (**self).save_history(record)
    }

    fn record_session(&self, session: &ReadingSession) -> Result<BookReadingHistory> {
        (**self).record_session(session)
    }
}
