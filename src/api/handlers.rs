use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{Book, LanguageFilter, Media, Movie},
    services::{RecentlyViewed, Recommendations},
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct LanguageQuery {
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct GenreQuery {
    /// Comma-separated TMDB genre ids
    pub genres: String,
}

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LanguageBody {
    pub language: LanguageFilter,
}

#[derive(Debug, Serialize)]
pub struct MovieDetailsResponse {
    pub movie: Movie,
    pub recommendations: Vec<Movie>,
}

#[derive(Debug, Serialize)]
pub struct BookDetailsResponse {
    pub book: Book,
    pub recommendations: Vec<Book>,
}

/// Parses `28, 12,878` into genre ids
fn parse_genre_ids(raw: &str) -> AppResult<Vec<i64>> {
    let ids = raw
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map_err(|_| AppError::InvalidInput(format!("Invalid genre id: {}", part)))
        })
        .collect::<AppResult<Vec<_>>>()?;

    if ids.is_empty() {
        return Err(AppError::InvalidInput(
            "At least one genre id is required".to_string(),
        ));
    }

    Ok(ids)
}

/// Explicit `language` parameter, or the stored preference when absent
async fn resolve_language(state: &AppState, query: LanguageQuery) -> LanguageFilter {
    match query.language {
        Some(raw) => raw.parse().unwrap_or_default(),
        None => state.store.language_preference().await,
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Popular movies filtered by language.
///
/// Served from the recommendation store once a load has filled it, fetched
/// from the provider otherwise. An on-demand fetch does not touch the store.
pub async fn popular_movies(
    State(state): State<AppState>,
    Query(query): Query<LanguageQuery>,
) -> AppResult<Json<Vec<Movie>>> {
    let language = resolve_language(&state, query).await;

    let mut popular = state.store.popular_movies(&LanguageFilter::All).await;
    if popular.is_empty() {
        tracing::debug!(provider = state.movies.name(), "No cached popular movies, fetching");
        popular = state.movies.get_popular().await?;
    }

    Ok(Json(language.apply(&popular)))
}

pub async fn search_movies(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<Movie>>> {
    let movies = state.movies.search(&params.q).await?;
    Ok(Json(movies))
}

pub async fn discover_movies(
    State(state): State<AppState>,
    Query(params): Query<GenreQuery>,
) -> AppResult<Json<Vec<Movie>>> {
    let genre_ids = parse_genre_ids(&params.genres)?;
    let movies = state.movies.get_by_genre(&genre_ids).await?;
    Ok(Json(movies))
}

/// Movie details page: fetches the movie, records the view and loads
/// recommendations seeded by it
pub async fn movie_details(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> AppResult<Json<MovieDetailsResponse>> {
    let movie = state.movies.get_details(&id).await?;
    state.store.record_view(Media::Movie(movie.clone())).await;

    let recommendations = state.movies.get_recommendations(&movie.id).await?;

    tracing::info!(
        request_id = %request_id,
        movie_id = %movie.id,
        recommendations = recommendations.len(),
        "Served movie details"
    );

    Ok(Json(MovieDetailsResponse {
        movie,
        recommendations,
    }))
}

/// Popular books filtered by language, with the same fallback as movies
pub async fn popular_books(
    State(state): State<AppState>,
    Query(query): Query<LanguageQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let language = resolve_language(&state, query).await;

    let mut popular = state.store.popular_books(&LanguageFilter::All).await;
    if popular.is_empty() {
        tracing::debug!(provider = state.books.name(), "No cached popular books, fetching");
        popular = state.books.get_popular().await?;
    }

    Ok(Json(language.apply(&popular)))
}

pub async fn search_books(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.books.search(&params.q).await?;
    Ok(Json(books))
}

pub async fn books_by_category(
    State(state): State<AppState>,
    Query(params): Query<CategoryQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.books.get_by_category(&params.name).await?;
    Ok(Json(books))
}

/// Book details page: fetches the volume, records the view and loads books
/// sharing its first category and author
pub async fn book_details(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> AppResult<Json<BookDetailsResponse>> {
    let book = state.books.get_details(&id).await?;
    state.store.record_view(Media::Book(book.clone())).await;

    let recommendations = state
        .books
        .get_recommendations(book.first_category(), book.first_author())
        .await?
        .into_iter()
        .filter(|candidate| candidate.id != book.id)
        .collect::<Vec<_>>();

    tracing::info!(
        request_id = %request_id,
        book_id = %book.id,
        recommendations = recommendations.len(),
        "Served book details"
    );

    Ok(Json(BookDetailsResponse {
        book,
        recommendations,
    }))
}

pub async fn get_recommendations(State(state): State<AppState>) -> Json<Recommendations> {
    Json(state.store.recommendations().await)
}

/// Re-runs the recommendation load and returns the fresh lists
pub async fn refresh_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<Recommendations>> {
    tracing::info!(request_id = %request_id, "Refreshing recommendations");
    state.store.load_recommendations().await?;
    Ok(Json(state.store.recommendations().await))
}

pub async fn get_recently_viewed(State(state): State<AppState>) -> Json<RecentlyViewed> {
    Json(state.store.recently_viewed().await)
}

/// Records a view reported by the client
pub async fn record_view(State(state): State<AppState>, Json(item): Json<Media>) -> StatusCode {
    state.store.record_view(item).await;
    StatusCode::NO_CONTENT
}

pub async fn get_language(State(state): State<AppState>) -> Json<LanguageBody> {
    Json(LanguageBody {
        language: state.store.language_preference().await,
    })
}

pub async fn set_language(
    State(state): State<AppState>,
    Json(body): Json<LanguageBody>,
) -> Json<LanguageBody> {
    state.store.set_language_preference(body.language).await;
    Json(LanguageBody {
        language: state.store.language_preference().await,
    })
}
