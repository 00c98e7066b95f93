use serde::{Deserialize, Serialize};

use crate::error::{ReadAgainError, Result};
use crate::models::history::check_scale;

/// A child whose reading is tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildProfile {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub reading_level: u8,

    #[serde(default)]
    pub favorite_genres: Vec<String>,

    /// Average minutes. Not used by the scorer yet.
    #[serde(default = "default_attention_span")]
    pub attention_span: u32,
}

fn default_attention_span() -> u32 {
    15
}

impl ChildProfile {
    pub fn new(id: impl Into<String>, name: impl Into<String>, age: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            age,
            reading_level: 1,
            favorite_genres: Vec::new(),
            attention_span: default_attention_span(),
        }
    }

    pub fn likes_genre(&self, genre: &str) -> bool {
        self.favorite_genres.iter().any(|g| g == genre)
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(ReadAgainError::InvalidArgument("child id is empty".into()));
        }
        check_scale("reading_level", self.reading_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_defaults() {
        let p = ChildProfile::new("emma", "Emma", 4);
        assert_eq!(p.reading_level, 1);
        assert_eq!(p.attention_span, 15);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_likes_genre_is_exact() {
        let mut p = ChildProfile::new("nile", "Nile", 3);
        p.favorite_genres = vec!["humor".into()];
        assert!(p.likes_genre("humor"));
        assert!(!p.likes_genre("Humor"));
    }

    #[test]
    fn test_missing_attention_span_deserializes() {
        let json = r#"{"id":"nile","name":"Nile","age":3,"reading_level":2}"#;
        let p: ChildProfile = serde_json::from_str(json).unwrap();
        assert_eq!(p.attention_span, 15);
        assert!(p.favorite_genres.is_empty());
    }
}
