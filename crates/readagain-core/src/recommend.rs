/// "Read again" scoring for a child's reading history.
///
/// score = spaced repetition + engagement + level match + educational value
///       + completion + genre preference + read-count balance
///
/// Every term is bounded, so a score always lands in [-2, 110] for inputs
/// on their documented scales. Inputs are never mutated and "now" is passed
/// in, so equal inputs give equal output.
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::clock::Clock;
use crate::error::{ReadAgainError, Result};
use crate::models::{BookReadingHistory, ChildProfile, RecommendationScore, ScoreBreakdown};
use crate::storage::HistoryStore;

pub const REASON_PERFECT_TIME: &str = "Perfect time to revisit";
pub const REASON_GOOD_TIME: &str = "Good time to re-read";
pub const REASON_LOVED: &str = "Loved this book";
pub const REASON_LEARNING: &str = "Great learning opportunity";
pub const REASON_FAVORITE_GENRE: &str = "Favorite genre";

/// Points for how long ago the book was last read.
///
/// `days` is whole days, truncated toward zero. Negative values (a last-read
/// date in the future) land in the bottom bucket.
pub fn spaced_repetition_points(days: i64) -> f64 {
    if days >= 30 {
        40.0
    } else if days >= 14 {
        30.0
    } else if days >= 7 {
        20.0
    } else if days >= 3 {
        10.0
    } else {
        5.0
    }
}

/// Points for how close the book's difficulty is to the child's level.
pub fn level_match_points(difficulty_level: u8, reading_level: u8) -> f64 {
    match (difficulty_level as i32 - reading_level as i32).abs() {
        0 => 20.0,
        1 => 15.0,
        2 => 5.0,
        _ => 0.0,
    }
}

/// Favour books that have not been read to death. The floor for 15+ reads
/// is a flat -2 however high the count goes.
pub fn read_count_points(read_count: u32) -> f64 {
    if read_count < 5 {
        5.0
    } else if read_count < 15 {
        0.0
    } else {
        -2.0
    }
}

fn days_since(last_read: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - last_read).num_days()
}

/// Compute each weighted term for one record.
pub fn score_breakdown(
    book: &BookReadingHistory,
    profile: &ChildProfile,
    now: DateTime<Utc>,
) -> ScoreBreakdown {
    let theme_count = book.educational_themes.len() as f64;

    ScoreBreakdown {
        spaced_repetition: spaced_repetition_points(days_since(book.last_read_date, now)),
        engagement: (book.engagement_rating as f64 / 5.0) * 25.0,
        level_match: level_match_points(book.difficulty_level, profile.reading_level),
        educational: (theme_count * 3.0).min(10.0),
        completion: book.completion_rate * 10.0,
        genre: if profile.likes_genre(&book.genre) { 5.0 } else { 0.0 },
        read_count: read_count_points(book.read_count),
    }
}

fn reasons_for(
    book: &BookReadingHistory,
    profile: &ChildProfile,
    breakdown: &ScoreBreakdown,
) -> Vec<String> {
    let mut reasons = Vec::new();

    if breakdown.spaced_repetition >= 40.0 {
        reasons.push(REASON_PERFECT_TIME.to_string());
    } else if breakdown.spaced_repetition >= 30.0 {
        reasons.push(REASON_GOOD_TIME.to_string());
    }
    if book.engagement_rating >= 4 {
        reasons.push(REASON_LOVED.to_string());
    }
    if book.educational_themes.len() >= 2 {
        reasons.push(REASON_LEARNING.to_string());
    }
    if profile.likes_genre(&book.genre) {
        reasons.push(REASON_FAVORITE_GENRE.to_string());
    }

    reasons
}

/// Score one record.
pub fn score_book(
    book: &BookReadingHistory,
    profile: &ChildProfile,
    now: DateTime<Utc>,
) -> RecommendationScore {
    let breakdown = score_breakdown(book, profile, now);
    RecommendationScore {
        book_id: book.book_id.clone(),
        score: breakdown.rounded(),
        reasons: reasons_for(book, profile, &breakdown),
    }
}

/// Score every record and order by score, highest first.
///
/// Equal scores keep their input order.
pub fn calculate_recommendation_scores(
    history: &[BookReadingHistory],
    profile: &ChildProfile,
    now: DateTime<Utc>,
) -> Vec<RecommendationScore> {
    let mut scores: Vec<RecommendationScore> = history
        .iter()
        .map(|book| score_book(book, profile, now))
        .collect();

    // sort_by is stable
    scores.sort_by(|a, b| b.score.cmp(&a.score));
    scores
}

/// Top `limit` records by score.
///
/// Each score is mapped back to its record by `book_id`. A score that cannot
/// be resolved is dropped, so fewer than `limit` records may come back.
pub fn get_recommended_books(
    history: &[BookReadingHistory],
    profile: &ChildProfile,
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<BookReadingHistory> {
    let scores = calculate_recommendation_scores(history, profile, now);
    resolve_scores(&scores, history, limit)
        .into_iter()
        .map(|(book, _)| book.clone())
        .collect()
}

/// Pair the first `limit` scores with their history records.
///
/// Records are consumed as they are matched, so repeated book ids resolve to
/// distinct records instead of the same one twice.
pub fn resolve_scores<'a>(
    scores: &'a [RecommendationScore],
    history: &'a [BookReadingHistory],
    limit: usize,
) -> Vec<(&'a BookReadingHistory, &'a RecommendationScore)> {
    let mut used = vec![false; history.len()];

    scores
        .iter()
        .take(limit)
        .filter_map(|score| {
            let idx = history
                .iter()
                .enumerate()
                .position(|(i, b)| !used[i] && b.book_id == score.book_id);
            match idx {
                Some(idx) => {
                    used[idx] = true;
                    Some((&history[idx], score))
                }
                None => {
                    debug!(book_id = %score.book_id, "dropping unresolved recommendation");
                    None
                }
            }
        })
        .collect()
}

// ─── Recommender ────────────────────────────────────────────

/// Binds a history store and a clock to the scoring functions.
pub struct Recommender<S, C> {
    store: S,
    clock: C,
}

impl<S: HistoryStore, C: Clock> Recommender<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    fn load(&self, child_id: &str) -> Result<(ChildProfile, Vec<BookReadingHistory>)> {
        let profile = self
            .store
            .fetch_profile(child_id)?
            .ok_or_else(|| ReadAgainError::ChildNotFound(child_id.to_string()))?;
        let history = self.store.fetch_history(child_id)?;
        Ok((profile, history))
    }

    /// Full scored list for a child, highest first.
    pub fn scores(&self, child_id: &str) -> Result<Vec<RecommendationScore>> {
        let (profile, history) = self.load(child_id)?;
        Ok(calculate_recommendation_scores(
            &history,
            &profile,
            self.clock.now(),
        ))
    }

    /// Top `limit` records to read again.
    pub fn recommend(&self, child_id: &str, limit: usize) -> Result<Vec<BookReadingHistory>> {
        Ok(self
            .recommend_scored(child_id, limit)?
            .into_iter()
            .map(|(book, _)| book)
            .collect())
    }

    /// Top `limit` records together with their scores.
    pub fn recommend_scored(
        &self,
        child_id: &str,
        limit: usize,
    ) -> Result<Vec<(BookReadingHistory, RecommendationScore)>> {
        let (profile, history) = self.load(child_id)?;
        let scores = calculate_recommendation_scores(&history, &profile, self.clock.now());
        debug!(child_id, scored = scores.len(), limit, "computed recommendations");

        Ok(resolve_scores(&scores, &history, limit)
            .into_iter()
            .map(|(book, score)| (book.clone(), score.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::fixtures;
    use crate::storage::InMemoryHistoryStore;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn profile() -> ChildProfile {
        ChildProfile {
            id: "nile".into(),
            name: "Nile".into(),
            age: 3,
            reading_level: 2,
            favorite_genres: vec!["educational".into(), "adventure".into(), "humor".into()],
            attention_span: 15,
        }
    }

    fn book(id: &str, days_ago: i64) -> BookReadingHistory {
        BookReadingHistory {
            book_id: id.into(),
            title: format!("Book {id}"),
            author: "Author".into(),
            search_query: String::new(),
            last_read_date: now() - Duration::days(days_ago),
            read_count: 8,
            total_reading_time: 30,
            completion_rate: 0.5,
            engagement_rating: 3,
            difficulty_level: 4,
            educational_themes: vec![],
            genre: "bedtime".into(),
            child_id: "nile".into(),
        }
    }

    #[test]
    fn test_worked_example() {
        let b = BookReadingHistory {
            book_id: "1".into(),
            title: "The Very Hungry Caterpillar".into(),
            author: "Eric Carle".into(),
            search_query: String::new(),
            last_read_date: now() - Duration::days(35),
            read_count: 12,
            total_reading_time: 45,
            completion_rate: 0.95,
            engagement_rating: 5,
            difficulty_level: 2,
            educational_themes: vec![
                "counting".into(),
                "life-cycles".into(),
                "days-of-week".into(),
            ],
            genre: "educational".into(),
            child_id: "nile".into(),
        };

        let parts = score_breakdown(&b, &profile(), now());
        assert_eq!(parts.spaced_repetition, 40.0);
        assert_eq!(parts.engagement, 25.0);
        assert_eq!(parts.level_match, 20.0);
        assert_eq!(parts.educational, 9.0);
        assert!((parts.completion - 9.5).abs() < 1e-9);
        assert_eq!(parts.genre, 5.0);
        assert_eq!(parts.read_count, 0.0);

        let scores = calculate_recommendation_scores(&[b], &profile(), now());
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].score, 109);
        assert_eq!(
            scores[0].reasons,
            vec![
                REASON_PERFECT_TIME,
                REASON_LOVED,
                REASON_LEARNING,
                REASON_FAVORITE_GENRE
            ]
        );
    }

    #[test]
    fn test_empty_history() {
        assert!(calculate_recommendation_scores(&[], &profile(), now()).is_empty());
        assert!(get_recommended_books(&[], &profile(), now(), 4).is_empty());
    }

    #[test]
    fn test_spaced_repetition_boundaries() {
        let p = profile();
        let at_30 = score_breakdown(&book("a", 30), &p, now());
        let at_29 = score_breakdown(&book("b", 29), &p, now());
        assert_eq!(at_30.spaced_repetition, 40.0);
        assert_eq!(at_29.spaced_repetition, 30.0);

        assert_eq!(spaced_repetition_points(14), 30.0);
        assert_eq!(spaced_repetition_points(13), 20.0);
        assert_eq!(spaced_repetition_points(7), 20.0);
        assert_eq!(spaced_repetition_points(3), 10.0);
        assert_eq!(spaced_repetition_points(2), 5.0);
    }

    #[test]
    fn test_fractional_days_truncate() {
        let mut b = book("a", 0);
        b.last_read_date = now() - Duration::days(29) - Duration::hours(23);
        assert_eq!(score_breakdown(&b, &profile(), now()).spaced_repetition, 30.0);
    }

    #[test]
    fn test_future_last_read_is_bottom_bucket() {
        let mut b = book("a", 0);
        b.last_read_date = now() + Duration::days(10);
        assert_eq!(score_breakdown(&b, &profile(), now()).spaced_repetition, 5.0);
    }

    #[test]
    fn test_reasons_for_good_time() {
        let scores = calculate_recommendation_scores(&[book("a", 20)], &profile(), now());
        assert_eq!(scores[0].reasons, vec![REASON_GOOD_TIME]);

        let scores = calculate_recommendation_scores(&[book("a", 5)], &profile(), now());
        assert!(scores[0].reasons.is_empty());
    }

    #[test]
    fn test_level_match_out_of_range() {
        assert_eq!(level_match_points(2, 2), 20.0);
        assert_eq!(level_match_points(1, 2), 15.0);
        assert_eq!(level_match_points(4, 2), 5.0);
        assert_eq!(level_match_points(9, 2), 0.0);
        assert_eq!(level_match_points(0, 5), 0.0);
    }

    #[test]
    fn test_read_count_floor() {
        assert_eq!(read_count_points(0), 5.0);
        assert_eq!(read_count_points(4), 5.0);
        assert_eq!(read_count_points(5), 0.0);
        assert_eq!(read_count_points(14), 0.0);
        assert_eq!(read_count_points(15), -2.0);
        assert_eq!(read_count_points(500), -2.0);
    }

    #[test]
    fn test_educational_cap() {
        let mut b = book("a", 1);
        b.educational_themes = (0..6).map(|i| format!("theme-{i}")).collect();
        assert_eq!(score_breakdown(&b, &profile(), now()).educational, 10.0);
    }

    #[test]
    fn test_sorted_descending_and_stable() {
        let history = vec![book("a", 1), book("b", 40), book("c", 1), book("d", 1)];
        let scores = calculate_recommendation_scores(&history, &profile(), now());

        let ids: Vec<&str> = scores.iter().map(|s| s.book_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c", "d"]);
        assert!(scores.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_idempotent() {
        let history = fixtures::sample_history(now());
        let first = calculate_recommendation_scores(&history, &profile(), now());
        let second = calculate_recommendation_scores(&history, &profile(), now());
        assert_eq!(first, second);
    }

    #[test]
    fn test_engagement_monotonic() {
        let mut previous = i64::MIN;
        for rating in 1..=5 {
            let mut b = book("a", 10);
            b.engagement_rating = rating;
            let score = score_book(&b, &profile(), now()).score;
            assert!(score >= previous, "rating {rating} lowered the score");
            previous = score;
        }
    }

    #[test]
    fn test_scores_within_bounds() {
        let history = fixtures::sample_history(now());
        let scores = calculate_recommendation_scores(&history, &profile(), now());
        assert_eq!(scores.len(), history.len());
        assert!(scores.iter().all(|s| (-2..=110).contains(&s.score)));
    }

    #[test]
    fn test_inputs_untouched() {
        let history = fixtures::sample_history(now());
        let snapshot = history.clone();
        let _ = calculate_recommendation_scores(&history, &profile(), now());
        assert_eq!(history, snapshot);
    }

    #[test]
    fn test_limit_larger_than_history() {
        let history = vec![book("a", 1), book("b", 40), book("c", 20)];
        let top = get_recommended_books(&history, &profile(), now(), 10);
        let ids: Vec<&str> = top.iter().map(|b| b.book_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_limit_truncates() {
        let history = fixtures::sample_history(now());
        let top = get_recommended_books(&history, &profile(), now(), 4);
        assert_eq!(top.len(), 4);
    }

    #[test]
    fn test_unresolved_scores_dropped() {
        let history = vec![book("a", 1)];
        let scores = vec![
            RecommendationScore {
                book_id: "ghost".into(),
                score: 99,
                reasons: vec![],
            },
            RecommendationScore {
                book_id: "a".into(),
                score: 10,
                reasons: vec![],
            },
        ];
        let resolved = resolve_scores(&scores, &history, 2);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].0.book_id, "a");
    }

    #[test]
    fn test_duplicate_ids_resolve_to_distinct_records() {
        let history = vec![book("a", 40), book("a", 1)];
        let top = get_recommended_books(&history, &profile(), now(), 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0], history[0]);
        assert_eq!(top[1], history[1]);
    }

    #[test]
    fn test_recommender_uses_store_and_clock() {
        let store = InMemoryHistoryStore::with_sample_data(now());
        let recommender = Recommender::new(store, FixedClock::new(now()));

        let top = recommender.recommend("nile", 4).unwrap();
        let titles: Vec<&str> = top.iter().map(|b| b.title.as_str()).collect();
        // Green Eggs and Ham and Chicka Chicka Boom Boom tie on 97
        assert_eq!(
            titles,
            vec![
                "Green Eggs and Ham",
                "Chicka Chicka Boom Boom",
                "Corduroy",
                "The Very Hungry Caterpillar"
            ]
        );

        let scored = recommender.recommend_scored("nile", 1).unwrap();
        assert_eq!(scored[0].0.book_id, scored[0].1.book_id);
    }

    #[test]
    fn test_recommender_unknown_child() {
        let recommender = Recommender::new(InMemoryHistoryStore::new(), FixedClock::new(now()));
        assert!(matches!(
            recommender.scores("nobody"),
            Err(ReadAgainError::ChildNotFound(_))
        ));
    }
}
