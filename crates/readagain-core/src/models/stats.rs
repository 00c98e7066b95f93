use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReadingStreak {
    pub current_streak: u32,
    pub longest_streak: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_read_date: Option<NaiveDate>,
}

/// One square of the reading heat-map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionDay {
    pub date: NaiveDate,
    /// Intensity bucket, 0–3.
    pub activity: u8,
    pub readings: u32,
    pub books_read: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReadingStats {
    pub total_books: usize,
    pub total_readings: usize,
    pub books_this_month: usize,
    pub readings_this_month: usize,
    pub total_minutes: u64,
    pub reading_streak: ReadingStreak,
}
