//! Reading streaks, the contribution heat-map and summary stats.
//!
//! All day arithmetic is on UTC calendar days.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{Datelike, Duration, NaiveDate};

use crate::error::{ReadAgainError, Result};
use crate::models::{
    BookReadingHistory, ContributionDay, ReadingSession, ReadingStats, ReadingStreak,
};

/// Highest heat-map intensity bucket.
pub const MAX_ACTIVITY: u8 = 3;

/// Widest heat-map accepted, about ten years.
pub const MAX_GRID_WEEKS: u32 = 520;

/// Streak of consecutive reading days.
///
/// The current streak is alive if the child read today or yesterday; days
/// after `today` are ignored.
pub fn reading_streak(
    dates: impl IntoIterator<Item = NaiveDate>,
    today: NaiveDate,
) -> ReadingStreak {
    let days: BTreeSet<NaiveDate> = dates.into_iter().filter(|d| *d <= today).collect();

    let mut longest = 0u32;
    let mut run = 0u32;
    let mut previous: Option<NaiveDate> = None;
    for day in &days {
        run = match previous {
            Some(p) if *day - p == Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(*day);
    }

    let yesterday = today - Duration::days(1);
    let anchor = if days.contains(&today) {
        Some(today)
    } else if days.contains(&yesterday) {
        Some(yesterday)
    } else {
        None
    };

    let mut current = 0u32;
    if let Some(mut day) = anchor {
        while days.contains(&day) {
            current += 1;
            day -= Duration::days(1);
        }
    }

    ReadingStreak {
        current_streak: current,
        longest_streak: longest,
        last_read_date: days.last().copied(),
    }
}

/// Intensity bucket for a day's number of readings.
pub fn activity_level(readings: u32) -> u8 {
    readings.min(MAX_ACTIVITY as u32) as u8
}

/// One entry per day for `weeks * 7` days ending `today`, oldest first.
///
/// Fails with `InvalidArgument` above [`MAX_GRID_WEEKS`] or when the window
/// would start before the earliest representable date.
pub fn contribution_grid(
    sessions: &[ReadingSession],
    today: NaiveDate,
    weeks: u32,
) -> Result<Vec<ContributionDay>> {
    if weeks > MAX_GRID_WEEKS {
        return Err(ReadAgainError::InvalidArgument(format!(
            "weeks must be at most {MAX_GRID_WEEKS}, got {weeks}"
        )));
    }
    let span = i64::from(weeks) * 7;
    if span == 0 {
        return Ok(Vec::new());
    }
    let start = Duration::try_days(span - 1)
        .and_then(|back| today.checked_sub_signed(back))
        .ok_or_else(|| {
            ReadAgainError::InvalidArgument(format!("{weeks} weeks before {today} is out of range"))
        })?;

    let mut per_day: HashMap<NaiveDate, (u32, HashSet<&str>)> = HashMap::new();
    for s in sessions {
        let day = s.read_at.date_naive();
        if day < start || day > today {
            continue;
        }
        let entry = per_day.entry(day).or_default();
        entry.0 += 1;
        entry.1.insert(s.book_id.as_str());
    }

    Ok((0..span)
        .map(|offset| {
            let date = start + Duration::days(offset);
            let (readings, books) = per_day
                .get(&date)
                .map(|(n, books)| (*n, books.len() as u32))
                .unwrap_or((0, 0));
            ContributionDay {
                date,
                activity: activity_level(readings),
                readings,
                books_read: books,
            }
        })
        .collect())
}

/// Summary numbers for a child's dashboard.
pub fn reading_stats(
    history: &[BookReadingHistory],
    sessions: &[ReadingSession],
    today: NaiveDate,
) -> ReadingStats {
    let total_books = history
        .iter()
        .map(|h| h.book_id.as_str())
        .collect::<HashSet<_>>()
        .len();
    let total_readings = history.iter().map(|h| h.read_count as usize).sum();
    let total_minutes = history.iter().map(|h| u64::from(h.total_reading_time)).sum();

    let this_month: Vec<&ReadingSession> = sessions
        .iter()
        .filter(|s| {
            let d = s.read_at.date_naive();
            d.year() == today.year() && d.month() == today.month() && d <= today
        })
        .collect();
    let books_this_month = this_month
        .iter()
        .map(|s| s.book_id.as_str())
        .collect::<HashSet<_>>()
        .len();

    ReadingStats {
        total_books,
        total_readings,
        books_this_month,
        readings_this_month: this_month.len(),
        total_minutes,
        reading_streak: reading_streak(sessions.iter().map(|s| s.read_at.date_naive()), today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use chrono::{TimeZone, Utc};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn session(book: &str, date: NaiveDate) -> ReadingSession {
        ReadingSession {
            child_id: "nile".into(),
            book_id: book.into(),
            read_at: Utc
                .from_utc_datetime(&date.and_hms_opt(19, 30, 0).unwrap()),
            minutes: 10,
            completion_rate: 1.0,
            engagement_rating: 4,
            book: None,
        }
    }

    #[test]
    fn test_streak_including_today() {
        let today = day(2024, 6, 15);
        let dates = [day(2024, 6, 13), day(2024, 6, 14), day(2024, 6, 15)];
        let streak = reading_streak(dates, today);
        assert_eq!(streak.current_streak, 3);
        assert_eq!(streak.longest_streak, 3);
        assert_eq!(streak.last_read_date, Some(today));
    }

    #[test]
    fn test_streak_alive_from_yesterday() {
        let today = day(2024, 6, 15);
        let dates = [day(2024, 6, 13), day(2024, 6, 14)];
        assert_eq!(reading_streak(dates, today).current_streak, 2);
    }

    #[test]
    fn test_streak_broken() {
        let today = day(2024, 6, 15);
        let dates = [
            day(2024, 6, 1),
            day(2024, 6, 2),
            day(2024, 6, 3),
            day(2024, 6, 4),
            day(2024, 6, 12),
        ];
        let streak = reading_streak(dates, today);
        assert_eq!(streak.current_streak, 0);
        assert_eq!(streak.longest_streak, 4);
    }

    #[test]
    fn test_streak_ignores_duplicates_and_future() {
        let today = day(2024, 6, 15);
        let dates = [day(2024, 6, 15), day(2024, 6, 15), day(2024, 6, 16)];
        let streak = reading_streak(dates, today);
        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.last_read_date, Some(today));
    }

    #[test]
    fn test_streak_empty() {
        assert_eq!(
            reading_streak(std::iter::empty(), day(2024, 6, 15)),
            ReadingStreak::default()
        );
    }

    #[test]
    fn test_grid_shape_and_levels() {
        let today = day(2024, 6, 15);
        let sessions = vec![
            session("1", today),
            session("1", today),
            session("2", today),
            session("3", today),
            session("1", day(2024, 6, 14)),
            session("9", day(2024, 1, 1)),
        ];
        let grid = contribution_grid(&sessions, today, 2).unwrap();
        assert_eq!(grid.len(), 14);
        assert_eq!(grid.first().unwrap().date, day(2024, 6, 2));

        let last = grid.last().unwrap();
        assert_eq!(last.date, today);
        assert_eq!(last.readings, 4);
        assert_eq!(last.books_read, 3);
        assert_eq!(last.activity, MAX_ACTIVITY);

        assert_eq!(grid[12].activity, 1);
        assert_eq!(grid[0].activity, 0);
    }

    #[test]
    fn test_grid_zero_weeks() {
        assert!(contribution_grid(&[], day(2024, 6, 15), 0).unwrap().is_empty());
    }

    #[test]
    fn test_grid_rejects_oversized_window() {
        let today = day(2024, 6, 15);
        let err = contribution_grid(&[], today, 100_000_000).unwrap_err();
        assert!(matches!(err, ReadAgainError::InvalidArgument(_)));

        assert_eq!(
            contribution_grid(&[], today, MAX_GRID_WEEKS).unwrap().len(),
            MAX_GRID_WEEKS as usize * 7
        );
        assert!(contribution_grid(&[], today, MAX_GRID_WEEKS + 1).is_err());
    }

    #[test]
    fn test_grid_near_earliest_date() {
        let err = contribution_grid(&[], NaiveDate::MIN, 1).unwrap_err();
        assert!(matches!(err, ReadAgainError::InvalidArgument(_)));
        assert_eq!(contribution_grid(&[], NaiveDate::MIN, 0).unwrap().len(), 0);
    }

    #[test]
    fn test_stats_from_sample_data() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let history = fixtures::sample_history(now);
        let sessions = fixtures::sample_sessions(now);
        let stats = reading_stats(&history, &sessions, now.date_naive());

        assert_eq!(stats.total_books, 8);
        assert_eq!(stats.total_readings, 90);
        assert_eq!(stats.total_minutes, 320);
        // 3, 5, 7, 10 and 14 days back fall in June
        assert_eq!(stats.readings_this_month, 5);
        assert_eq!(stats.books_this_month, 5);
        assert_eq!(stats.reading_streak.current_streak, 0);
        assert_eq!(stats.reading_streak.longest_streak, 1);
    }
}
