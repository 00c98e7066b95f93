pub mod analytics;
pub mod clock;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod models;
pub mod recommend;
pub mod storage;

pub use config::{AppConfig, CatalogConfig};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ExitCode, ReadAgainError, Result};
pub use models::*;

pub use recommend::{
    Recommender, calculate_recommendation_scores, get_recommended_books, score_breakdown,
};
pub use storage::{
    ChildRecord, HistoryCache, HistoryStore, InMemoryHistoryStore, JsonHistoryStore,
};
