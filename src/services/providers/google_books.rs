/// Google Books provider
///
/// Google Books has no "popular" or "recommendations" endpoints; both are
/// expressed as volume searches with subject/author qualifiers.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::Book,
    services::providers::{check_status, BookProvider},
};
use reqwest::Client as HttpClient;
use serde::Deserialize;

const PROVIDER: &str = "google_books";
const LIST_MAX_RESULTS: u32 = 20;
const RECOMMENDATION_MAX_RESULTS: u32 = 10;
const FALLBACK_QUERY: &str = "subject:fiction";

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    /// Absent when the search matched nothing
    #[serde(default)]
    items: Vec<Book>,
}

/// Builds the search query used for book recommendations.
///
/// The category leads when present, the author narrows it further, and a
/// generic fiction query covers the case where neither is known.
pub fn recommendation_query(category: &str, author: &str) -> String {
    let category = category.trim();
    let author = author.trim();

    match (category.is_empty(), author.is_empty()) {
        (false, false) => format!("subject:{} inauthor:{}", category, author),
        (false, true) => format!("subject:{}", category),
        (true, false) => format!("inauthor:{}", author),
        (true, true) => FALLBACK_QUERY.to_string(),
    }
}

#[derive(Clone)]
pub struct GoogleBooksProvider {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
    cache: Option<Cache>,
    cache_ttl: u64,
}

impl GoogleBooksProvider {
    pub fn new(
        cache: Option<Cache>,
        cache_ttl: u64,
        api_key: Option<String>,
        api_url: String,
    ) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
            cache_ttl,
        }
    }

    fn with_key(&self, mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        if let Some(key) = &self.api_key {
            params.push(("key", key.clone()));
        }
        params
    }

    /// Parameters for a volume search
    fn search_params(&self, query: &str, max_results: u32) -> Vec<(&'static str, String)> {
        self.with_key(vec![
            ("q", query.to_string()),
            ("maxResults", max_results.to_string()),
        ])
    }

    async fn search_volumes(
        &self,
        params: Vec<(&'static str, String)>,
        what: &str,
    ) -> AppResult<Vec<Book>> {
        let response = self
            .http_client
            .get(&self.api_url)
            .query(&params)
            .send()
            .await?;
        let response = check_status(response, PROVIDER, what).await?;

        let volumes: VolumesResponse = response.json().await?;

        tracing::info!(
            results = volumes.items.len(),
            provider = PROVIDER,
            "Fetched {}",
            what
        );

        Ok(volumes.items)
    }
}

#[async_trait::async_trait]
impl BookProvider for GoogleBooksProvider {
    async fn get_popular(&self) -> AppResult<Vec<Book>> {
        let mut params = self.search_params(FALLBACK_QUERY, LIST_MAX_RESULTS);
        params.push(("orderBy", "relevance".to_string()));

        self.search_volumes(params, "popular books").await
    }

    async fn search(&self, text: &str) -> AppResult<Vec<Book>> {
        let query = text.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        cached!(
            self.cache,
            CacheKey::BookSearch(query.to_string()),
            self.cache_ttl,
            async move {
                self.search_volumes(
                    self.search_params(query, LIST_MAX_RESULTS),
                    "book search results",
                )
                .await
            }
        )
    }

    async fn get_by_category(&self, category: &str) -> AppResult<Vec<Book>> {
        let category = category.trim();
        if category.is_empty() {
            return Err(AppError::InvalidInput(
                "Category cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::BooksByCategory(category.to_string()),
            self.cache_ttl,
            async move {
                self.search_volumes(
                    self.search_params(&format!("subject:{}", category), LIST_MAX_RESULTS),
                    "books by category",
                )
                .await
            }
        )
    }

    async fn get_details(&self, id: &str) -> AppResult<Book> {
        if id.trim().is_empty() {
            return Err(AppError::InvalidInput("Book id cannot be empty".to_string()));
        }

        cached!(
            self.cache,
            CacheKey::BookDetails(id.to_string()),
            self.cache_ttl,
            async move {
                let response = self
                    .http_client
                    .get(format!("{}/{}", self.api_url, id))
                    .query(&self.with_key(Vec::new()))
                    .send()
                    .await?;
                let response = check_status(response, PROVIDER, "book details").await?;
                let book: Book = response.json().await?;

                tracing::info!(book_id = %id, provider = PROVIDER, "Fetched book details");

                Ok::<Book, AppError>(book)
            }
        )
    }

    async fn get_recommendations(&self, category: &str, author: &str) -> AppResult<Vec<Book>> {
        let query = recommendation_query(category, author);

        cached!(
            self.cache,
            CacheKey::BookRecommendations(query.clone()),
            self.cache_ttl,
            async {
                tracing::debug!(query = %query, "Requesting book recommendations");
                self.search_volumes(
                    self.search_params(&query, RECOMMENDATION_MAX_RESULTS),
                    "book recommendations",
                )
                .await
            }
        )
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}
