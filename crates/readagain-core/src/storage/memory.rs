use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::error::{ReadAgainError, Result};
use crate::fixtures;
use crate::models::{BookReadingHistory, ChildProfile, ReadingSession};
use crate::storage::{ChildRecord, HistoryStore};

/// Process-local store. Backs tests and the sample data set.
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    children: RwLock<BTreeMap<String, ChildRecord>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the sample child, history and sessions.
    pub fn with_sample_data(now: DateTime<Utc>) -> Self {
        let mut record = ChildRecord::new(fixtures::sample_profile());
        record.history = fixtures::sample_history(now);
        record.sessions = fixtures::sample_sessions(now);
        record.sessions.sort_by_key(|s| s.read_at);
        Self::from_records(vec![record])
    }

    pub fn from_records(records: Vec<ChildRecord>) -> Self {
        let children = records
            .into_iter()
            .map(|r| (r.profile.id.clone(), r))
            .collect();
        Self {
            children: RwLock::new(children),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, ChildRecord>> {
        self.children.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, ChildRecord>> {
        self.children.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn fetch_history(&self, child_id: &str) -> Result<Vec<BookReadingHistory>> {
        Ok(self
            .read()
            .get(child_id)
            .map(|r| r.history.clone())
            .unwrap_or_default())
    }

    fn fetch_profile(&self, child_id: &str) -> Result<Option<ChildProfile>> {
        Ok(self.read().get(child_id).map(|r| r.profile.clone()))
    }

    fn fetch_sessions(&self, child_id: &str) -> Result<Vec<ReadingSession>> {
        Ok(self
            .read()
            .get(child_id)
            .map(|r| r.sessions.clone())
            .unwrap_or_default())
    }

    fn list_children(&self) -> Result<Vec<ChildProfile>> {
        Ok(self.read().values().map(|r| r.profile.clone()).collect())
    }

    fn save_profile(&self, profile: &ChildProfile) -> Result<()> {
        profile.validate()?;
        let mut children = self.write();
        match children.get_mut(&profile.id) {
            Some(record) => record.profile = profile.clone(),
            None => {
                children.insert(profile.id.clone(), ChildRecord::new(profile.clone()));
            }
        }
        Ok(())
    }

    fn save_history(&self, record: &BookReadingHistory) -> Result<()> {
        let mut children = self.write();
        let child = children
            .get_mut(&record.child_id)
            .ok_or_else(|| ReadAgainError::ChildNotFound(record.child_id.clone()))?;
        child.upsert_history(record.clone())
    }

    fn record_session(&self, session: &ReadingSession) -> Result<BookReadingHistory> {
        let mut children = self.write();
        let child = children
            .get_mut(&session.child_id)
            .ok_or_else(|| ReadAgainError::ChildNotFound(session.child_id.clone()))?;
        child.apply_session(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_store() {
        let store = InMemoryHistoryStore::with_sample_data(Utc::now());
        assert_eq!(store.fetch_history("nile").unwrap().len(), 8);
        assert_eq!(store.fetch_sessions("nile").unwrap().len(), 8);
        assert_eq!(store.list_children().unwrap().len(), 1);
        assert!(store.fetch_history("emma").unwrap().is_empty());
        assert!(store.fetch_profile("emma").unwrap().is_none());
    }

    #[test]
    fn test_session_for_unknown_child() {
        let store = InMemoryHistoryStore::new();
        let session = ReadingSession {
            child_id: "emma".into(),
            book_id: "1".into(),
            read_at: Utc::now(),
            minutes: 5,
            completion_rate: 1.0,
            engagement_rating: 3,
            book: None,
        };
        assert!(matches!(
            store.record_session(&session),
            Err(ReadAgainError::ChildNotFound(_))
        ));
    }

    #[test]
    fn test_save_profile_then_history() {
        let store = InMemoryHistoryStore::new();
        store.save_profile(&fixtures::sample_profile()).unwrap();
        let record = fixtures::sample_history(Utc::now()).remove(0);
        store.save_history(&record).unwrap();
        assert_eq!(store.fetch_history("nile").unwrap(), vec![record]);
    }
}
