//! Sample child and reading history used to seed a fresh store and in tests.
//!
//! Dates are relative to the `now` passed in so the data never goes stale.

use chrono::{DateTime, Duration, Utc};

use crate::models::{BookReadingHistory, ChildProfile, ReadingSession};

pub const SAMPLE_CHILD_ID: &str = "nile";

struct SampleBook {
    id: &'static str,
    title: &'static str,
    author: &'static str,
    query: &'static str,
    days_ago: i64,
    read_count: u32,
    minutes: u32,
    completion: f64,
    engagement: u8,
    difficulty: u8,
    themes: &'static [&'static str],
    genre: &'static str,
}

const SAMPLE_BOOKS: &[SampleBook] = &[
    SampleBook {
        id: "1",
        title: "The Very Hungry Caterpillar",
        author: "Eric Carle",
        query: "The Very Hungry Caterpillar Eric Carle",
        days_ago: 7,
        read_count: 12,
        minutes: 45,
        completion: 0.95,
        engagement: 5,
        difficulty: 2,
        themes: &["counting", "life-cycles", "days-of-week"],
        genre: "educational",
    },
    SampleBook {
        id: "2",
        title: "Goodnight Moon",
        author: "Margaret Wise Brown",
        query: "Goodnight Moon Margaret Wise Brown",
        days_ago: 3,
        read_count: 8,
        minutes: 32,
        completion: 1.0,
        engagement: 4,
        difficulty: 1,
        themes: &["bedtime-routine", "objects-identification"],
        genre: "bedtime",
    },
    SampleBook {
        id: "3",
        title: "Where the Wild Things Are",
        author: "Maurice Sendak",
        query: "Where the Wild Things Are Maurice Sendak",
        days_ago: 14,
        read_count: 6,
        minutes: 55,
        completion: 0.85,
        engagement: 4,
        difficulty: 3,
        themes: &["imagination", "emotions", "family-bonds"],
        genre: "adventure",
    },
    SampleBook {
        id: "4",
        title: "Green Eggs and Ham",
        author: "Dr. Seuss",
        query: "Green Eggs and Ham Dr. Seuss",
        days_ago: 21,
        read_count: 15,
        minutes: 38,
        completion: 1.0,
        engagement: 5,
        difficulty: 2,
        themes: &["persistence", "trying-new-things", "rhyming"],
        genre: "humor",
    },
    SampleBook {
        id: "5",
        title: "Brown Bear, Brown Bear",
        author: "Bill Martin Jr.",
        query: "Brown Bear Brown Bear What Do You See Bill Martin",
        days_ago: 5,
        read_count: 20,
        minutes: 25,
        completion: 1.0,
        engagement: 4,
        difficulty: 1,
        themes: &["colors", "animals", "pattern-recognition"],
        genre: "educational",
    },
    SampleBook {
        id: "6",
        title: "The Gruffalo",
        author: "Julia Donaldson",
        query: "The Gruffalo Julia Donaldson",
        days_ago: 10,
        read_count: 4,
        minutes: 48,
        completion: 0.9,
        engagement: 5,
        difficulty: 3,
        themes: &["problem-solving", "courage", "forest-animals"],
        genre: "adventure",
    },
    SampleBook {
        id: "7",
        title: "Chicka Chicka Boom Boom",
        author: "Bill Martin Jr.",
        query: "Chicka Chicka Boom Boom Bill Martin",
        days_ago: 28,
        read_count: 18,
        minutes: 35,
        completion: 1.0,
        engagement: 5,
        difficulty: 2,
        themes: &["alphabet", "letters", "rhyming"],
        genre: "educational",
    },
    SampleBook {
        id: "8",
        title: "Corduroy",
        author: "Don Freeman",
        query: "Corduroy Don Freeman bear",
        days_ago: 35,
        read_count: 7,
        minutes: 42,
        completion: 0.95,
        engagement: 4,
        difficulty: 3,
        themes: &["friendship", "belonging", "shopping"],
        genre: "friendship",
    },
];

pub fn sample_profile() -> ChildProfile {
    ChildProfile {
        id: SAMPLE_CHILD_ID.to_string(),
        name: "Nile".to_string(),
        age: 3,
        reading_level: 2,
        favorite_genres: vec![
            "educational".to_string(),
            "adventure".to_string(),
            "humor".to_string(),
        ],
        attention_span: 15,
    }
}

pub fn sample_history(now: DateTime<Utc>) -> Vec<BookReadingHistory> {
    SAMPLE_BOOKS
        .iter()
        .map(|b| BookReadingHistory {
            book_id: b.id.to_string(),
            title: b.title.to_string(),
            author: b.author.to_string(),
            search_query: b.query.to_string(),
            last_read_date: now - Duration::days(b.days_ago),
            read_count: b.read_count,
            total_reading_time: b.minutes,
            completion_rate: b.completion,
            engagement_rating: b.engagement,
            difficulty_level: b.difficulty,
            educational_themes: b.themes.iter().map(|t| t.to_string()).collect(),
            genre: b.genre.to_string(),
            child_id: SAMPLE_CHILD_ID.to_string(),
        })
        .collect()
}

/// The most recent session behind each sample record.
pub fn sample_sessions(now: DateTime<Utc>) -> Vec<ReadingSession> {
    sample_history(now)
        .into_iter()
        .map(|h| ReadingSession {
            child_id: h.child_id,
            book_id: h.book_id,
            read_at: h.last_read_date,
            minutes: h.total_reading_time / h.read_count.max(1),
            completion_rate: h.completion_rate,
            engagement_rating: h.engagement_rating,
            book: None,
        })
        .collect()
}
