use serde::{Deserialize, Serialize};

use crate::error::{ReadAgainError, Result};
use crate::models::{BookReadingHistory, ChildProfile, ReadingSession};

/// Everything stored for one child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildRecord {
    pub profile: ChildProfile,

    #[serde(default)]
    pub history: Vec<BookReadingHistory>,

    #[serde(default)]
    pub sessions: Vec<ReadingSession>,
}

impl ChildRecord {
    pub fn new(profile: ChildProfile) -> Self {
        Self {
            profile,
            history: Vec::new(),
            sessions: Vec::new(),
        }
    }

    /// Insert or replace a history record by `book_id`.
    pub fn upsert_history(&mut self, record: BookReadingHistory) -> Result<()> {
        if record.child_id != self.profile.id {
            return Err(ReadAgainError::InvalidArgument(format!(
                "record for child {} saved under {}",
                record.child_id, self.profile.id
            )));
        }
        record.validate()?;

        match self.history.iter_mut().find(|h| h.book_id == record.book_id) {
            Some(existing) => *existing = record,
            None => self.history.push(record),
        }
        Ok(())
    }

    /// Fold a session into the matching history record and append it to the log.
    pub fn apply_session(&mut self, session: &ReadingSession) -> Result<BookReadingHistory> {
        session.validate()?;

        let updated = match self
            .history
            .iter_mut()
            .find(|h| h.book_id == session.book_id)
        {
            Some(existing) => {
                existing.apply_session(session);
                existing.clone()
            }
            None => {
                let details = session
                    .book
                    .as_ref()
                    .ok_or_else(|| ReadAgainError::BookNotFound(session.book_id.clone()))?;
                let created = BookReadingHistory::from_first_session(session, details);
                self.history.push(created.clone());
                created
            }
        };

        let insert_at = self
            .sessions
            .partition_point(|s| s.read_at <= session.read_at);
        self.sessions.insert(insert_at, session.clone());

        Ok(updated)
    }
}
