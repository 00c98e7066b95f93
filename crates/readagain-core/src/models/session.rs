use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ReadAgainError, Result};
use crate::models::history::{check_rate, check_scale};

/// One logged reading of a book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingSession {
    pub child_id: String,
    pub book_id: String,
    pub read_at: DateTime<Utc>,
    pub minutes: u32,
    pub completion_rate: f64,
    pub engagement_rating: u8,

    /// Catalog details, required the first time a child reads a book.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book: Option<BookDetails>,
}

/// Static per-book attributes assigned at catalog ingestion.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BookDetails {
    pub title: String,
    pub author: String,

    #[serde(default)]
    pub search_query: String,

    pub difficulty_level: u8,

    #[serde(default)]
    pub educational_themes: Vec<String>,

    pub genre: String,
}

impl ReadingSession {
    pub fn validate(&self) -> Result<()> {
        if self.child_id.trim().is_empty() || self.book_id.trim().is_empty() {
            return Err(ReadAgainError::InvalidArgument(
                "session needs a child id and a book id".into(),
            ));
        }
        check_scale("engagement_rating", self.engagement_rating)?;
        check_rate("completion_rate", self.completion_rate)?;
        if let Some(details) = &self.book {
            if details.title.trim().is_empty() {
                return Err(ReadAgainError::InvalidArgument("book title is empty".into()));
            }
            check_scale("difficulty_level", details.difficulty_level)?;
        }
        Ok(())
    }
}
