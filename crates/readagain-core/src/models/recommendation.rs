use serde::{Deserialize, Serialize};

/// Desirability of re-reading one book. Derived on every call, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationScore {
    pub book_id: String,
    pub score: i64,
    pub reasons: Vec<String>,
}

/// The seven additive terms behind a [`RecommendationScore`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub spaced_repetition: f64,
    pub engagement: f64,
    pub level_match: f64,
    pub educational: f64,
    pub completion: f64,
    pub genre: f64,
    pub read_count: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.spaced_repetition
            + self.engagement
            + self.level_match
            + self.educational
            + self.completion
            + self.genre
            + self.read_count
    }

    /// Total rounded to the nearest integer, halves rounding up.
    pub fn rounded(&self) -> i64 {
        (self.total() + 0.5).floor() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding_half_up() {
        let b = ScoreBreakdown {
            spaced_repetition: 40.0,
            completion: 9.5,
            ..Default::default()
        };
        assert_eq!(b.rounded(), 50);

        let neg = ScoreBreakdown {
            read_count: -2.5,
            ..Default::default()
        };
        assert_eq!(neg.rounded(), -2);
    }
}
