use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use cinebook_api::{
    api::{create_router, AppState},
    db::{KeyValueStore, MemoryStore, StorageKey},
    error::{AppError, AppResult},
    models::{Book, Movie, VolumeInfo},
    services::providers::{BookProvider, MovieProvider},
};

fn movie(id: &str, language: &str) -> Movie {
    let mut movie = Movie::new(id, format!("Movie {}", id));
    movie.original_language = Some(language.to_string());
    movie
}

fn book(id: &str, category: &str, author: &str, language: &str) -> Book {
    Book::new(
        id,
        Some(VolumeInfo {
            title: format!("Book {}", id),
            categories: Some(vec![category.to_string()]),
            authors: Some(vec![author.to_string()]),
            language: Some(language.to_string()),
            ..Default::default()
        }),
    )
}

/// Movie provider serving canned data and recording recommendation seeds
#[derive(Default)]
struct FakeMovies {
    fail_popular: AtomicBool,
    hang_popular: AtomicBool,
    popular_calls: AtomicUsize,
    seeds: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl MovieProvider for FakeMovies {
    async fn get_popular(&self) -> AppResult<Vec<Movie>> {
        self.popular_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_popular.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_popular.load(Ordering::SeqCst) {
            return Err(AppError::ExternalApi(
                "Failed to fetch popular movies".to_string(),
            ));
        }
        Ok((1..=20)
            .map(|i| movie(&format!("p{}", i), if i % 2 == 0 { "fr" } else { "en" }))
            .collect())
    }

    async fn search(&self, text: &str) -> AppResult<Vec<Movie>> {
        if text.trim().is_empty() {
            return Ok(vec![]);
        }
        Ok(vec![movie("27205", "en"), movie("496243", "ko")])
    }

    async fn get_by_genre(&self, genre_ids: &[i64]) -> AppResult<Vec<Movie>> {
        Ok(genre_ids
            .iter()
            .map(|id| movie(&format!("g{}", id), "en"))
            .collect())
    }

    async fn get_details(&self, id: &str) -> AppResult<Movie> {
        if id == "missing" {
            return Err(AppError::NotFound("movie details not found at fake".to_string()));
        }
        Ok(movie(id, "en"))
    }

    async fn get_recommendations(&self, seed_id: &str) -> AppResult<Vec<Movie>> {
        self.seeds.lock().unwrap().push(seed_id.to_string());
        Ok(vec![movie(&format!("rec-{}", seed_id), "en")])
    }

    fn name(&self) -> &'static str {
        "fake_movies"
    }
}

/// Book provider serving canned data and recording recommendation queries
#[derive(Default)]
struct FakeBooks {
    queries: Mutex<Vec<(String, String)>>,
}

#[async_trait::async_trait]
impl BookProvider for FakeBooks {
    async fn get_popular(&self) -> AppResult<Vec<Book>> {
        Ok(vec![
            book("b1", "Fiction", "A", "en"),
            book("b2", "Poetry", "B", "de"),
            Book::new("b3", None),
            book("b4", "History", "C", "en"),
            book("b5", "Fiction", "D", "en"),
            book("b6", "Fiction", "E", "en"),
            book("b7", "Fiction", "F", "en"),
        ])
    }

    async fn search(&self, _text: &str) -> AppResult<Vec<Book>> {
        Ok(vec![book("s1", "Fiction", "A", "en")])
    }

    async fn get_by_category(&self, category: &str) -> AppResult<Vec<Book>> {
        if category.trim().is_empty() {
            return Err(AppError::InvalidInput("Category cannot be empty".to_string()));
        }
        Ok(vec![book("c1", category, "A", "en")])
    }

    async fn get_details(&self, id: &str) -> AppResult<Book> {
        Ok(book(id, "Fiction", "J. Tolkien", "en"))
    }

    async fn get_recommendations(&self, category: &str, author: &str) -> AppResult<Vec<Book>> {
        self.queries
            .lock()
            .unwrap()
            .push((category.to_string(), author.to_string()));
        Ok(vec![
            book("hobbit", category, author, "en"),
            book("silmarillion", category, author, "en"),
        ])
    }

    fn name(&self) -> &'static str {
        "fake_books"
    }
}

struct Harness {
    server: TestServer,
    state: AppState,
    movies: Arc<FakeMovies>,
    books: Arc<FakeBooks>,
    storage: Arc<MemoryStore>,
}

async fn create_harness(storage: MemoryStore) -> Harness {
    let movies = Arc::new(FakeMovies::default());
    let books = Arc::new(FakeBooks::default());
    let storage = Arc::new(storage);

    let state = AppState::new(movies.clone(), books.clone(), storage.clone()).await;
    let server = TestServer::new(create_router(state.clone())).unwrap();

    Harness {
        server,
        state,
        movies,
        books,
        storage,
    }
}

async fn create_test_server() -> Harness {
    create_harness(MemoryStore::new()).await
}

fn ids(value: &Value) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let harness = create_test_server().await;
    let response = harness.server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let harness = create_test_server().await;
    let response = harness.server.get("/health").await;

    let header = response.headers().get("x-request-id").cloned();
    assert!(header.is_some());
}

#[tokio::test]
async fn test_popular_fetched_on_demand_before_first_load() {
    let harness = create_test_server().await;

    let response = harness
        .server
        .get("/api/v1/movies/popular")
        .add_query_param("language", "en")
        .await;
    response.assert_status_ok();
    assert_eq!(ids(&response.json::<Value>()).len(), 10);
    assert_eq!(harness.movies.popular_calls.load(Ordering::SeqCst), 1);

    let books: Value = harness.server.get("/api/v1/books/popular").await.json();
    assert_eq!(ids(&books).len(), 7);

    // The store is only filled by a recommendation load
    let recommendations: Value = harness.server.get("/api/v1/recommendations").await.json();
    assert!(recommendations["movies"].as_array().unwrap().is_empty());
    assert!(recommendations["refreshed_at"].is_null());

    harness
        .server
        .post("/api/v1/recommendations/refresh")
        .await
        .assert_status_ok();
    assert_eq!(harness.movies.popular_calls.load(Ordering::SeqCst), 2);

    let cached: Value = harness.server.get("/api/v1/movies/popular").await.json();
    assert_eq!(ids(&cached).len(), 20);
    assert_eq!(harness.movies.popular_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_popular_on_demand_failure_is_reported() {
    let harness = create_test_server().await;
    harness.movies.fail_popular.store(true, Ordering::SeqCst);

    let response = harness
        .server
        .get("/api/v1/movies/popular")
        .expect_failure()
        .await;
    response.assert_status(StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_initial_load_runs_in_background() {
    let harness = create_test_server().await;
    harness.movies.hang_popular.store(true, Ordering::SeqCst);

    let load = harness.state.spawn_initial_load();
    for _ in 0..100 {
        if harness.state.store.is_loading() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(harness.state.store.is_loading());

    harness.server.get("/health").await.assert_status_ok();

    let recommendations: Value = harness.server.get("/api/v1/recommendations").await.json();
    assert_eq!(recommendations["is_loading"], true);

    let recent = harness.server.get("/api/v1/recently-viewed").await;
    recent.assert_status_ok();

    load.abort();
}

#[tokio::test]
async fn test_refresh_without_history_uses_popular_head() {
    let harness = create_test_server().await;

    let response = harness.server.post("/api/v1/recommendations/refresh").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(ids(&body["movies"]), vec!["p1", "p2", "p3", "p4", "p5", "p6"]);
    assert_eq!(ids(&body["books"]), vec!["b1", "b2", "b3", "b4", "b5", "b6"]);
    assert_eq!(body["is_loading"], false);
    assert!(body["refreshed_at"].is_string());

    let response = harness.server.get("/api/v1/recommendations").await;
    let cached: Value = response.json();
    assert_eq!(cached["movies"], body["movies"]);
}

#[tokio::test]
async fn test_movie_details_records_view_and_seeds_refresh() {
    let harness = create_test_server().await;

    let response = harness.server.get("/api/v1/movies/27205").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["movie"]["id"], "27205");
    assert_eq!(ids(&body["recommendations"]), vec!["rec-27205"]);

    let recent: Value = harness.server.get("/api/v1/recently-viewed").await.json();
    assert_eq!(ids(&recent["movies"]), vec!["27205"]);

    let refreshed: Value = harness
        .server
        .post("/api/v1/recommendations/refresh")
        .await
        .json();
    assert_eq!(ids(&refreshed["movies"]), vec!["rec-27205"]);

    let seeds = harness.movies.seeds.lock().unwrap().clone();
    assert_eq!(seeds, vec!["27205".to_string(), "27205".to_string()]);
}

#[tokio::test]
async fn test_book_details_excludes_itself_and_seeds_refresh() {
    let harness = create_test_server().await;

    let response = harness.server.get("/api/v1/books/hobbit").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["book"]["volumeInfo"]["title"], "Book hobbit");
    assert_eq!(ids(&body["recommendations"]), vec!["silmarillion"]);

    harness
        .server
        .post("/api/v1/recommendations/refresh")
        .await
        .assert_status_ok();

    let queries = harness.books.queries.lock().unwrap().clone();
    assert_eq!(queries.len(), 2);
    assert_eq!(
        queries[1],
        ("Fiction".to_string(), "J. Tolkien".to_string())
    );
}

#[tokio::test]
async fn test_missing_movie_returns_not_found() {
    let harness = create_test_server().await;

    let response = harness.server.get("/api/v1/movies/missing").await;
    response.assert_status(StatusCode::NOT_FOUND);

    let recent: Value = harness.server.get("/api/v1/recently-viewed").await.json();
    assert!(recent["movies"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_record_view_endpoint_dedupes_and_bounds() {
    let harness = create_test_server().await;

    for i in 0..12 {
        harness
            .server
            .post("/api/v1/recently-viewed")
            .json(&json!({ "kind": "movie", "item": { "id": i, "title": format!("M{}", i) } }))
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }
    harness
        .server
        .post("/api/v1/recently-viewed")
        .json(&json!({ "kind": "movie", "item": { "id": "5" } }))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let recent: Value = harness.server.get("/api/v1/recently-viewed").await.json();
    let movies = ids(&recent["movies"]);
    assert_eq!(movies.len(), 10);
    assert_eq!(movies[0], "5");
    assert_eq!(movies[1], "11");
    assert!(!movies.contains(&"0".to_string()));
    assert!(!movies.contains(&"1".to_string()));

    let raw = harness
        .storage
        .get(StorageKey::RecentlyViewedMovies)
        .await
        .unwrap()
        .unwrap();
    let stored: Vec<Value> = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored.len(), 10);
}

#[tokio::test]
async fn test_record_view_keeps_item_as_sent() {
    let harness = create_test_server().await;
    let item = json!({
        "id": "27205",
        "title": "Inception",
        "adult": false,
        "imdb_id": "tt1375666",
        "belongs_to_collection": null
    });

    harness
        .server
        .post("/api/v1/recently-viewed")
        .json(&json!({ "kind": "movie", "item": item.clone() }))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    harness
        .server
        .post("/api/v1/recently-viewed")
        .json(&json!({ "kind": "movie", "item": { "id": 550, "vote_average": null } }))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let recent: Value = harness.server.get("/api/v1/recently-viewed").await.json();
    assert_eq!(recent["movies"][0], json!({ "id": "550" }));
    assert_eq!(recent["movies"][1], item);
}

#[tokio::test]
async fn test_record_view_rejects_unknown_kind() {
    let harness = create_test_server().await;

    let response = harness
        .server
        .post("/api/v1/recently-viewed")
        .json(&json!({ "kind": "album", "item": { "id": "1" } }))
        .expect_failure()
        .await;
    assert!(response.status_code().is_client_error());
}

#[tokio::test]
async fn test_popular_filtered_by_language() {
    let harness = create_test_server().await;
    harness
        .server
        .post("/api/v1/recommendations/refresh")
        .await
        .assert_status_ok();

    let english: Value = harness
        .server
        .get("/api/v1/movies/popular")
        .add_query_param("language", "en")
        .await
        .json();
    let english_ids = ids(&english);
    assert_eq!(english_ids.len(), 10);
    assert!(english_ids.iter().all(|id| {
        let n: u32 = id.trim_start_matches('p').parse().unwrap();
        n % 2 == 1
    }));

    let all: Value = harness
        .server
        .get("/api/v1/movies/popular")
        .add_query_param("language", "all")
        .await
        .json();
    assert_eq!(ids(&all).len(), 20);

    let german: Value = harness
        .server
        .get("/api/v1/books/popular")
        .add_query_param("language", "de")
        .await
        .json();
    assert_eq!(ids(&german), vec!["b2"]);
}

#[tokio::test]
async fn test_language_preference_applies_to_popular() {
    let harness = create_test_server().await;
    harness
        .server
        .post("/api/v1/recommendations/refresh")
        .await
        .assert_status_ok();

    let response = harness
        .server
        .put("/api/v1/preferences/language")
        .json(&json!({ "language": "fr" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["language"], "fr");

    let current: Value = harness.server.get("/api/v1/preferences/language").await.json();
    assert_eq!(current["language"], "fr");

    let movies: Value = harness.server.get("/api/v1/movies/popular").await.json();
    assert_eq!(ids(&movies).len(), 10);
    assert_eq!(ids(&movies)[0], "p2");

    // Search results are never filtered by the preference
    let search: Value = harness
        .server
        .get("/api/v1/movies/search")
        .add_query_param("q", "inception")
        .await
        .json();
    assert_eq!(ids(&search), vec!["27205", "496243"]);

    let persisted = harness
        .storage
        .get(StorageKey::PreferredLanguage)
        .await
        .unwrap();
    assert_eq!(persisted, Some("fr".to_string()));
}

#[tokio::test]
async fn test_refresh_failure_keeps_previous_lists() {
    let harness = create_test_server().await;

    let first: Value = harness
        .server
        .post("/api/v1/recommendations/refresh")
        .await
        .json();

    harness.movies.fail_popular.store(true, Ordering::SeqCst);

    let response = harness
        .server
        .post("/api/v1/recommendations/refresh")
        .expect_failure()
        .await;
    response.assert_status(StatusCode::BAD_GATEWAY);
    let error: Value = response.json();
    assert!(error["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to load recommendations"));

    let current: Value = harness.server.get("/api/v1/recommendations").await.json();
    assert_eq!(current["movies"], first["movies"]);
    assert_eq!(current["books"], first["books"]);
    assert_eq!(current["refreshed_at"], first["refreshed_at"]);
}

#[tokio::test]
async fn test_discover_and_category_routes() {
    let harness = create_test_server().await;

    let movies: Value = harness
        .server
        .get("/api/v1/movies/discover")
        .add_query_param("genres", "28,12")
        .await
        .json();
    assert_eq!(ids(&movies), vec!["g28", "g12"]);

    let bad = harness
        .server
        .get("/api/v1/movies/discover")
        .add_query_param("genres", "action")
        .expect_failure()
        .await;
    bad.assert_status(StatusCode::BAD_REQUEST);

    let books: Value = harness
        .server
        .get("/api/v1/books/category")
        .add_query_param("name", "Poetry")
        .await
        .json();
    assert_eq!(ids(&books), vec!["c1"]);
}

#[tokio::test]
async fn test_state_restored_from_storage() {
    let storage = MemoryStore::with_entries([
        (
            StorageKey::RecentlyViewedBooks,
            json!([{
                "id": "dune",
                "volumeInfo": {
                    "title": "Dune",
                    "categories": ["Science Fiction"],
                    "authors": ["Frank Herbert"]
                }
            }])
            .to_string(),
        ),
        (StorageKey::RecentlyViewedMovies, "corrupted".to_string()),
        (StorageKey::PreferredLanguage, "en".to_string()),
    ]);
    let harness = create_harness(storage).await;

    let recent: Value = harness.server.get("/api/v1/recently-viewed").await.json();
    assert_eq!(ids(&recent["books"]), vec!["dune"]);
    assert!(recent["movies"].as_array().unwrap().is_empty());

    let language: Value = harness.server.get("/api/v1/preferences/language").await.json();
    assert_eq!(language["language"], "en");

    harness
        .server
        .post("/api/v1/recommendations/refresh")
        .await
        .assert_status_ok();
    let queries = harness.books.queries.lock().unwrap().clone();
    assert_eq!(
        queries,
        vec![("Science Fiction".to_string(), "Frank Herbert".to_string())]
    );
}
