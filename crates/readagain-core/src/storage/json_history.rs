use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::{ReadAgainError, Result};
use crate::models::{BookReadingHistory, ChildProfile, ReadingSession};
use crate::storage::{ChildRecord, HistoryStore};

/// One pretty-printed JSON document per child: `{dir}/{child_id}.json`.
pub struct JsonHistoryStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonHistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, child_id: &str) -> Result<PathBuf> {
        let valid = !child_id.is_empty()
            && !child_id.starts_with('.')
            && !child_id.contains(['/', '\\']);
        if !valid {
            return Err(ReadAgainError::InvalidArgument(format!(
                "invalid child id: {child_id:?}"
            )));
        }
        Ok(self.dir.join(format!("{child_id}.json")))
    }

    /// Load a child's document, `None` if it does not exist.
    pub fn load_record(&self, child_id: &str) -> Result<Option<ChildRecord>> {
        let path = self.path_for(child_id)?;
        if !path.exists() {
            return Ok(None);
        }
        debug!(path = %path.display(), "loading child record");
        Ok(Some(load_record_file(&path)?))
    }

    /// Write a child's whole document.
    pub fn save_record(&self, record: &ChildRecord) -> Result<PathBuf> {
        let path = self.path_for(&record.profile.id)?;
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&path, json)?;
        Ok(path)
    }

    /// Load, mutate and save one child's document under the write lock.
    fn update<T>(
        &self,
        child_id: &str,
        f: impl FnOnce(&mut ChildRecord) -> Result<T>,
    ) -> Result<T> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut record = self
            .load_record(child_id)?
            .ok_or_else(|| ReadAgainError::ChildNotFound(child_id.to_string()))?;
        let out = f(&mut record)?;
        self.save_record(&record)?;
        Ok(out)
    }
}

fn load_record_file(path: &Path) -> Result<ChildRecord> {
    let contents = fs::read_to_string(path)?;
    let record: ChildRecord = serde_json::from_str(&contents)?;
    Ok(record)
}

impl HistoryStore for JsonHistoryStore {
    fn fetch_history(&self, child_id: &str) -> Result<Vec<BookReadingHistory>> {
        Ok(self
            .load_record(child_id)?
            .map(|r| r.history)
            .unwrap_or_default())
    }

    fn fetch_profile(&self, child_id: &str) -> Result<Option<ChildProfile>> {
        Ok(self.load_record(child_id)?.map(|r| r.profile))
    }

    fn fetch_sessions(&self, child_id: &str) -> Result<Vec<ReadingSession>> {
        Ok(self
            .load_record(child_id)?
            .map(|r| r.sessions)
            .unwrap_or_default())
    }

    fn list_children(&self) -> Result<Vec<ChildProfile>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut children = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                match load_record_file(&path) {
                    Ok(record) => children.push(record.profile),
                    Err(e) => warn!(path = %path.display(), error = %e, "skipping invalid child record"),
                }
            }
        }
        children.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(children)
    }

    fn save_profile(&self, profile: &ChildProfile) -> Result<()> {
        profile.validate()?;
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let record = match self.load_record(&profile.id)? {
            Some(mut existing) => {
                existing.profile = profile.clone();
                existing
            }
            None => ChildRecord::new(profile.clone()),
        };
        self.save_record(&record)?;
        Ok(())
    }

    fn save_history(&self, record: &BookReadingHistory) -> Result<()> {
        self.update(&record.child_id, |child| child.upsert_history(record.clone()))
    }

    fn record_session(&self, session: &ReadingSession) -> Result<BookReadingHistory> {
        self.update(&session.child_id, |child| child.apply_session(session))
    }
}
