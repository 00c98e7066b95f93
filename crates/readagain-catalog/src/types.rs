use serde::{Deserialize, Serialize};

use readagain_core::BookReadingHistory;

/// Cover image sizes offered by the catalog.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large: Option<String>,
}

impl ImageLinks {
    /// Thumbnail, else the small image.
    pub fn cover(&self) -> Option<&str> {
        self.thumbnail.as_deref().or(self.small.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryIdentifier {
    #[serde(rename = "type")]
    pub kind: String,
    pub identifier: String,
}

/// One catalog search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSearchResult {
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_links: Option<ImageLinks>,

    #[serde(default)]
    pub industry_identifiers: Vec<IndustryIdentifier>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,

    #[serde(default)]
    pub categories: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
}

/// Best cover found for a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub catalog_id: String,
}

/// A recommended book ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadAgainBook {
    pub book: BookReadingHistory,
    pub cover_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_id: Option<String>,
}
