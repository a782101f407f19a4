use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Movies
        .route("/movies/popular", get(handlers::popular_movies))
        .route("/movies/search", get(handlers::search_movies))
        .route("/movies/discover", get(handlers::discover_movies))
        .route("/movies/:id", get(handlers::movie_details))
        // Books
        .route("/books/popular", get(handlers::popular_books))
        .route("/books/search", get(handlers::search_books))
        .route("/books/category", get(handlers::books_by_category))
        .route("/books/:id", get(handlers::book_details))
        // Recommendations
        .route("/recommendations", get(handlers::get_recommendations))
        .route(
            "/recommendations/refresh",
            post(handlers::refresh_recommendations),
        )
        .route(
            "/recently-viewed",
            get(handlers::get_recently_viewed).post(handlers::record_view),
        )
        // Preferences
        .route(
            "/preferences/language",
            get(handlers::get_language).put(handlers::set_language),
        )
}
