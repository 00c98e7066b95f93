use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ReadAgainError, Result};
use crate::models::session::{BookDetails, ReadingSession};

/// Reading history of one book for one child.
///
/// Units are fixed: minutes for reading time, 0–1 for completion, and
/// 1–5 integer scales for engagement and difficulty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookReadingHistory {
    pub book_id: String,
    pub title: String,
    pub author: String,

    /// Free-text query used to look the book up in the catalog.
    #[serde(default)]
    pub search_query: String,

    pub last_read_date: DateTime<Utc>,
    pub read_count: u32,

    /// Cumulative minutes.
    pub total_reading_time: u32,

    pub completion_rate: f64,
    pub engagement_rating: u8,
    pub difficulty_level: u8,

    #[serde(default)]
    pub educational_themes: Vec<String>,

    pub genre: String,
    pub child_id: String,
}

impl BookReadingHistory {
    /// Start a history record from a child's first session with a book.
    pub fn from_first_session(session: &ReadingSession, details: &BookDetails) -> Self {
        let search_query = if details.search_query.trim().is_empty() {
            format!("{} {}", details.title, details.author).trim().to_string()
        } else {
            details.search_query.clone()
        };

        Self {
            book_id: session.book_id.clone(),
            title: details.title.clone(),
            author: details.author.clone(),
            search_query,
            last_read_date: session.read_at,
            read_count: 1,
            total_reading_time: session.minutes,
            completion_rate: session.completion_rate,
            engagement_rating: session.engagement_rating,
            difficulty_level: details.difficulty_level,
            educational_themes: details.educational_themes.clone(),
            genre: details.genre.clone(),
            child_id: session.child_id.clone(),
        }
    }

    /// Fold one more session into this record.
    ///
    /// Completion becomes the running mean over all sessions, engagement
    /// takes the latest reaction, and the last-read date never moves back.
    pub fn apply_session(&mut self, session: &ReadingSession) {
        let previous = self.read_count as f64;
        self.completion_rate =
            (self.completion_rate * previous + session.completion_rate) / (previous + 1.0);
        self.read_count = self.read_count.saturating_add(1);
        self.total_reading_time = self.total_reading_time.saturating_add(session.minutes);
        self.engagement_rating = session.engagement_rating;
        if session.read_at > self.last_read_date {
            self.last_read_date = session.read_at;
        }
    }

    /// Check field ranges. The scorer never calls this; stores do on write.
    pub fn validate(&self) -> Result<()> {
        if self.book_id.trim().is_empty() {
            return Err(ReadAgainError::InvalidArgument("book_id is empty".into()));
        }
        if self.child_id.trim().is_empty() {
            return Err(ReadAgainError::InvalidArgument("child_id is empty".into()));
        }
        check_scale("engagement_rating", self.engagement_rating)?;
        check_scale("difficulty_level", self.difficulty_level)?;
        check_rate("completion_rate", self.completion_rate)
    }
}

/// Validate a 1–5 integer scale.
pub(crate) fn check_scale(field: &str, value: u8) -> Result<()> {
    if (1..=5).contains(&value) {
        Ok(())
    } else {
        Err(ReadAgainError::InvalidArgument(format!(
            "{field} must be between 1 and 5, got {value}"
        )))
    }
}

/// Validate a 0–1 fraction.
pub(crate) fn check_rate(field: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ReadAgainError::InvalidArgument(format!(
            "{field} must be between 0 and 1, got {value}"
        )))
    }
}
