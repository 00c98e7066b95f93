use async_trait::async_trait;
use futures::future::join_all;
use tracing::warn;

use readagain_core::BookReadingHistory;

use crate::error::Result;
use crate::placeholder::placeholder_url;
use crate::types::{CoverMatch, ReadAgainBook};

/// Finds the best catalog match for a free-text query.
#[async_trait]
pub trait CoverLookup: Send + Sync {
    async fn best_match(&self, query: &str) -> Result<Option<CoverMatch>>;
}

fn lookup_query(book: &BookReadingHistory) -> String {
    if book.search_query.trim().is_empty() {
        format!("{} {}", book.title, book.author)
    } else {
        book.search_query.clone()
    }
}

async fn resolve_one<L: CoverLookup + ?Sized>(
    lookup: &L,
    book: BookReadingHistory,
    placeholder_base: &str,
) -> ReadAgainBook {
    let found = match lookup.best_match(&lookup_query(&book)).await {
        Ok(found) => found,
        Err(e) => {
            warn!(title = %book.title, error = %e, "failed to fetch book cover");
            None
        }
    };

    let (cover_url, catalog_id) = match found {
        Some(CoverMatch {
            image_url: Some(url),
            catalog_id,
        }) => (url, Some(catalog_id)),
        Some(CoverMatch {
            image_url: None,
            catalog_id,
        }) => (placeholder_url(placeholder_base, &book.title), Some(catalog_id)),
        None => (placeholder_url(placeholder_base, &book.title), None),
    };

    ReadAgainBook {
        book,
        cover_url,
        catalog_id,
    }
}

/// Attach a cover to every book, one concurrent lookup each.
///
/// Output order matches input order. A failed or empty lookup falls back to
/// a placeholder image; it never fails the batch.
pub async fn resolve_covers<L: CoverLookup + ?Sized>(
    lookup: &L,
    books: Vec<BookReadingHistory>,
    placeholder_base: &str,
) -> Vec<ReadAgainBook> {
    join_all(
        books
            .into_iter()
            .map(|book| resolve_one(lookup, book, placeholder_base)),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use chrono::Utc;
    use readagain_core::fixtures;
    use std::time::Duration;

    /// Answers by title keyword; slower for earlier books to shuffle completion order.
    struct FakeLookup;

    #[async_trait]
    impl CoverLookup for FakeLookup {
        async fn best_match(&self, query: &str) -> Result<Option<CoverMatch>> {
            if query.contains("Caterpillar") {
                tokio::time::sleep(Duration::from_millis(30)).await;
                Ok(Some(CoverMatch {
                    image_url: Some("http://covers/caterpillar.jpg".into()),
                    catalog_id: "cat-1".into(),
                }))
            } else if query.contains("Goodnight") {
                Err(CatalogError::Parse("bad payload".into()))
            } else if query.contains("Wild Things") {
                Ok(Some(CoverMatch {
                    image_url: None,
                    catalog_id: "wild-1".into(),
                }))
            } else {
                Ok(None)
            }
        }
    }

    #[tokio::test]
    async fn test_resolve_covers_preserves_order_and_falls_back() {
        let books: Vec<_> = fixtures::sample_history(Utc::now())
            .into_iter()
            .take(4)
            .collect();
        let resolved = resolve_covers(&FakeLookup, books.clone(), "/api/placeholder").await;

        assert_eq!(resolved.len(), 4);
        let ids: Vec<&str> = resolved.iter().map(|r| r.book.book_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);

        assert_eq!(resolved[0].cover_url, "http://covers/caterpillar.jpg");
        assert_eq!(resolved[0].catalog_id.as_deref(), Some("cat-1"));

        assert_eq!(
            resolved[1].cover_url,
            "/api/placeholder?height=120&width=80&text=Goodnight"
        );
        assert!(resolved[1].catalog_id.is_none());

        assert_eq!(
            resolved[2].cover_url,
            "/api/placeholder?height=120&width=80&text=Where"
        );
        assert_eq!(resolved[2].catalog_id.as_deref(), Some("wild-1"));

        assert_eq!(
            resolved[3].cover_url,
            "/api/placeholder?height=120&width=80&text=Green"
        );
        assert_eq!(resolved[3].book, books[3]);
    }

    #[tokio::test]
    async fn test_resolve_empty() {
        assert!(resolve_covers(&FakeLookup, Vec::new(), "/p").await.is_empty());
    }

    #[test]
    fn test_lookup_query_falls_back_to_title_author() {
        let mut book = fixtures::sample_history(Utc::now()).remove(0);
        assert_eq!(lookup_query(&book), "The Very Hungry Caterpillar Eric Carle");
        book.search_query.clear();
        book.title = "Corduroy".into();
        book.author = "Don Freeman".into();
        assert_eq!(lookup_query(&book), "Corduroy Don Freeman");
    }
}
