/// Metadata provider abstraction
///
/// Movies and books come from two independent REST services. Each is wrapped
/// behind a trait so the recommendation store and the HTTP handlers can be
/// exercised without network access.
use crate::{
    error::AppResult,
    models::{Book, Movie},
};

pub mod google_books;
pub mod tmdb;

pub use google_books::GoogleBooksProvider;
pub use tmdb::TmdbProvider;

/// Movie metadata source
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieProvider: Send + Sync {
    /// Provider-curated popular listing
    async fn get_popular(&self) -> AppResult<Vec<Movie>>;

    /// Free-text search. Blank text yields an empty list without a request.
    async fn search(&self, text: &str) -> AppResult<Vec<Movie>>;

    /// Movies matching every genre in `genre_ids`, most popular first
    async fn get_by_genre(&self, genre_ids: &[i64]) -> AppResult<Vec<Movie>>;

    /// Full details including credits and videos
    async fn get_details(&self, id: &str) -> AppResult<Movie>;

    /// Recommendations seeded by a single movie
    async fn get_recommendations(&self, seed_id: &str) -> AppResult<Vec<Movie>>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Book metadata source
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait BookProvider: Send + Sync {
    /// Provider-curated popular listing
    async fn get_popular(&self) -> AppResult<Vec<Book>>;

    /// Free-text search. Blank text yields an empty list without a request.
    async fn search(&self, text: &str) -> AppResult<Vec<Book>>;

    /// Books in a subject category
    async fn get_by_category(&self, category: &str) -> AppResult<Vec<Book>>;

    /// A single volume
    async fn get_details(&self, id: &str) -> AppResult<Book>;

    /// Books related to a category and/or author; either may be empty
    async fn get_recommendations(&self, category: &str, author: &str) -> AppResult<Vec<Book>>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Turns a non-success provider response into an error, keeping the body
/// for diagnostics.
pub(crate) async fn check_status(
    response: reqwest::Response,
    provider: &str,
    what: &str,
) -> AppResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::error!(
        provider = provider,
        status = %status,
        body = %body,
        "Provider request failed: {}",
        what
    );

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(crate::error::AppError::NotFound(format!(
            "{} not found at {}",
            what, provider
        )));
    }

    Err(crate::error::AppError::ExternalApi(format!(
        "Failed to fetch {}: {} returned status {}",
        what, provider, status
    )))
}
