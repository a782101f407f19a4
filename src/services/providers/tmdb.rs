/// TMDB movie provider
///
/// Every request carries the API key and the configured locale. List
/// endpoints wrap their entries in a `results` array.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::Movie,
    services::providers::{check_status, MovieProvider},
};
use reqwest::Client as HttpClient;
use serde::Deserialize;

const PROVIDER: &str = "tmdb";

#[derive(Debug, Deserialize)]
struct PagedResponse {
    #[serde(default)]
    results: Vec<Movie>,
}

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    language: String,
    cache: Option<Cache>,
    cache_ttl: u64,
}

impl TmdbProvider {
    pub fn new(
        cache: Option<Cache>,
        cache_ttl: u64,
        api_key: String,
        api_url: String,
        language: String,
    ) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            language,
            cache,
            cache_ttl,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Query parameters shared by every request
    fn base_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("api_key", self.api_key.clone()),
            ("language", self.language.clone()),
        ]
    }

    async fn fetch_list(
        &self,
        path: &str,
        extra: &[(&'static str, String)],
        what: &str,
    ) -> AppResult<Vec<Movie>> {
        let mut params = self.base_params();
        params.extend_from_slice(extra);

        let response = self
            .http_client
            .get(self.url(path))
            .query(&params)
            .send()
            .await?;
        let response = check_status(response, PROVIDER, what).await?;

        let page: PagedResponse = response.json().await?;

        tracing::info!(
            path = %path,
            results = page.results.len(),
            provider = PROVIDER,
            "Fetched {}",
            what
        );

        Ok(page.results)
    }
}

/// Joins genre ids into the comma-separated form TMDB expects (logical AND)
fn genre_param(genre_ids: &[i64]) -> String {
    genre_ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait::async_trait]
impl MovieProvider for TmdbProvider {
    async fn get_popular(&self) -> AppResult<Vec<Movie>> {
        self.fetch_list("/movie/popular", &[("page", "1".to_string())], "popular movies")
            .await
    }

    async fn search(&self, text: &str) -> AppResult<Vec<Movie>> {
        let query = text.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        cached!(
            self.cache,
            CacheKey::MovieSearch(query.to_string()),
            self.cache_ttl,
            async move {
                self.fetch_list(
                    "/search/movie",
                    &[
                        ("query", query.to_string()),
                        ("page", "1".to_string()),
                        ("include_adult", "false".to_string()),
                    ],
                    "movie search results",
                )
                .await
            }
        )
    }

    async fn get_by_genre(&self, genre_ids: &[i64]) -> AppResult<Vec<Movie>> {
        if genre_ids.is_empty() {
            return Err(AppError::InvalidInput(
                "At least one genre id is required".to_string(),
            ));
        }

        let genres = genre_param(genre_ids);

        cached!(
            self.cache,
            CacheKey::MoviesByGenre(genres.clone()),
            self.cache_ttl,
            async {
                self.fetch_list(
                    "/discover/movie",
                    &[
                        ("with_genres", genres.clone()),
                        ("sort_by", "popularity.desc".to_string()),
                        ("page", "1".to_string()),
                    ],
                    "movies by genre",
                )
                .await
            }
        )
    }

    async fn get_details(&self, id: &str) -> AppResult<Movie> {
        if id.trim().is_empty() {
            return Err(AppError::InvalidInput("Movie id cannot be empty".to_string()));
        }

        cached!(
            self.cache,
            CacheKey::MovieDetails(id.to_string()),
            self.cache_ttl,
            async move {
                let mut params = self.base_params();
                params.push(("append_to_response", "credits,videos".to_string()));

                let response = self
                    .http_client
                    .get(self.url(&format!("/movie/{}", id)))
                    .query(&params)
                    .send()
                    .await?;
                let response = check_status(response, PROVIDER, "movie details").await?;
                let movie: Movie = response.json().await?;

                tracing::info!(movie_id = %id, provider = PROVIDER, "Fetched movie details");

                Ok::<Movie, AppError>(movie)
            }
        )
    }

    async fn get_recommendations(&self, seed_id: &str) -> AppResult<Vec<Movie>> {
        if seed_id.trim().is_empty() {
            return Err(AppError::InvalidInput("Seed movie id cannot be empty".to_string()));
        }

        cached!(
            self.cache,
            CacheKey::MovieRecommendations(seed_id.to_string()),
            self.cache_ttl,
            async move {
                self.fetch_list(
                    &format!("/movie/{}/recommendations", seed_id),
                    &[("page", "1".to_string())],
                    "movie recommendations",
                )
                .await
            }
        )
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}
