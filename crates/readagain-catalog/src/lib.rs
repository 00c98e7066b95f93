//! readagain catalog: book metadata lookups and cover resolution.

pub mod covers;
pub mod error;
pub mod google_books;
pub mod http;
pub mod placeholder;
pub mod types;

pub use covers::{CoverLookup, resolve_covers};
pub use error::{CatalogError, Result};
pub use google_books::GoogleBooksClient;
pub use placeholder::{PlaceholderImage, placeholder_url};
pub use types::{BookSearchResult, CoverMatch, ImageLinks, IndustryIdentifier, ReadAgainBook};
