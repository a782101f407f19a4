use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Arc,
};
use tokio::sync::RwLock;

use crate::{
    db::{KeyValueStore, StorageKey},
    error::{AppError, AppResult},
    models::{Book, Catalogued, LanguageFilter, Media, MediaKind, Movie},
    services::{
        providers::{BookProvider, MovieProvider},
        recency::RecencyList,
    },
};

/// Number of popular items used as recommendations when nothing was viewed
pub const FALLBACK_RECOMMENDATION_COUNT: usize = 6;

/// Cached popular list and derived recommendations for one kind
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationState<T> {
    pub popular: Vec<T>,
    pub recommended: Vec<T>,
}

impl<T> Default for RecommendationState<T> {
    fn default() -> Self {
        Self {
            popular: Vec::new(),
            recommended: Vec::new(),
        }
    }
}

/// Snapshot of both recency lists
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentlyViewed {
    pub movies: Vec<Movie>,
    pub books: Vec<Book>,
}

/// Snapshot of both recommended lists
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendations {
    pub movies: Vec<Movie>,
    pub books: Vec<Book>,
    pub is_loading: bool,
    pub refreshed_at: Option<DateTime<Utc>>,
}

struct StoreState {
    recent_movies: RecencyList<Movie>,
    recent_books: RecencyList<Book>,
    language: LanguageFilter,
    movies: RecommendationState<Movie>,
    books: RecommendationState<Book>,
    refreshed_at: Option<DateTime<Utc>>,
    /// Ticket of the newest load whose result has been applied
    applied_ticket: u64,
}

/// Seed for the book recommendation query
struct BookSeed {
    category: String,
    author: String,
}

/// Tracks recently viewed movies and books and derives recommendations.
///
/// Recency lists and the language preference are read from storage once in
/// [`RecommendationStore::load`] and written back after every change.
/// Popular and recommended lists only change when
/// [`RecommendationStore::load_recommendations`] runs.
pub struct RecommendationStore {
    movie_provider: Arc<dyn MovieProvider>,
    book_provider: Arc<dyn BookProvider>,
    storage: Arc<dyn KeyValueStore>,
    state: RwLock<StoreState>,
    in_flight: AtomicUsize,
    next_ticket: AtomicU64,
}

/// Marks a recommendation load as in flight for as long as it lives
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RecommendationStore {
    /// Creates the store and restores persisted per-user state.
    ///
    /// Missing, unreadable or malformed values fall back to empty lists and
    /// the "all" language filter.
    pub async fn load(
        movie_provider: Arc<dyn MovieProvider>,
        book_provider: Arc<dyn BookProvider>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        let recent_movies: RecencyList<Movie> =
            read_recency(storage.as_ref(), StorageKey::RecentlyViewedMovies).await;
        let recent_books: RecencyList<Book> =
            read_recency(storage.as_ref(), StorageKey::RecentlyViewedBooks).await;

        let language = match storage.get(StorageKey::PreferredLanguage).await {
            Ok(Some(raw)) => raw.parse::<LanguageFilter>().unwrap_or_default(),
            Ok(None) => LanguageFilter::All,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    backend = storage.name(),
                    "Failed to read language preference, using default"
                );
                LanguageFilter::All
            }
        };

        tracing::info!(
            recent_movies = recent_movies.len(),
            recent_books = recent_books.len(),
            language = %language,
            backend = storage.name(),
            "Restored recommendation state"
        );

        Self {
            movie_provider,
            book_provider,
            storage,
            state: RwLock::new(StoreState {
                recent_movies,
                recent_books,
                language,
                movies: RecommendationState::default(),
                books: RecommendationState::default(),
                refreshed_at: None,
                applied_ticket: 0,
            }),
            in_flight: AtomicUsize::new(0),
            next_ticket: AtomicU64::new(0),
        }
    }

    /// Records that `item` was viewed.
    ///
    /// The item moves to the front of its kind's recency list and the list is
    /// persisted. Storage failures are logged; the in-memory update stands.
    pub async fn record_view(&self, item: Media) {
        let kind = item.kind();
        let id = item.id().to_string();

        // The lock is held across the write so storage sees mutations in order.
        let mut state = self.state.write().await;
        let (key, encoded, len) = match item {
            Media::Movie(movie) => {
                state.recent_movies.record(movie);
                (
                    StorageKey::RecentlyViewedMovies,
                    serde_json::to_string(&state.recent_movies),
                    state.recent_movies.len(),
                )
            }
            Media::Book(book) => {
                state.recent_books.record(book);
                (
                    StorageKey::RecentlyViewedBooks,
                    serde_json::to_string(&state.recent_books),
                    state.recent_books.len(),
                )
            }
        };

        tracing::debug!(kind = %kind, id = %id, recent = len, "Recorded view");

        match encoded {
            Ok(json) => self.persist(key, json).await,
            Err(e) => tracing::error!(error = %e, key = %key, "Failed to encode recency list"),
        }
    }

    /// Refreshes popular and recommended lists for both kinds.
    ///
    /// Both popular lists are fetched concurrently. A kind with viewing history
    /// gets provider recommendations seeded by its most recent item; a kind
    /// without history gets the first few popular items. Any provider failure
    /// aborts the whole refresh and leaves the previous lists in place.
    ///
    /// When loads overlap, a result is dropped if a later-started load has
    /// already been applied.
    pub async fn load_recommendations(&self) -> AppResult<()> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        let _loading = LoadingGuard::new(&self.in_flight);

        let (movie_seed, book_seed) = {
            let state = self.state.read().await;
            (
                state.recent_movies.head().map(|movie| movie.id.clone()),
                state.recent_books.head().map(|book| BookSeed {
                    category: book.first_category().to_string(),
                    author: book.first_author().to_string(),
                }),
            )
        };

        tracing::info!(
            ticket = ticket,
            movie_seed = ?movie_seed,
            has_book_seed = book_seed.is_some(),
            "Loading recommendations"
        );

        let (popular_movies, popular_books) = tokio::try_join!(
            self.movie_provider.get_popular(),
            self.book_provider.get_popular()
        )
        .map_err(|e| load_failed(ticket, e))?;

        let recommended_movies = async {
            match &movie_seed {
                Some(seed_id) => self.movie_provider.get_recommendations(seed_id).await,
                None => Ok(fallback(&popular_movies)),
            }
        };
        let recommended_books = async {
            match &book_seed {
                Some(seed) => {
                    self.book_provider
                        .get_recommendations(&seed.category, &seed.author)
                        .await
                }
                None => Ok(fallback(&popular_books)),
            }
        };

        let (recommended_movies, recommended_books) =
            tokio::try_join!(recommended_movies, recommended_books)
                .map_err(|e| load_failed(ticket, e))?;

        let mut state = self.state.write().await;
        if ticket < state.applied_ticket {
            tracing::warn!(
                ticket = ticket,
                applied = state.applied_ticket,
                "Discarding recommendations from a superseded load"
            );
            return Ok(());
        }

        tracing::info!(
            ticket = ticket,
            popular_movies = popular_movies.len(),
            popular_books = popular_books.len(),
            recommended_movies = recommended_movies.len(),
            recommended_books = recommended_books.len(),
            "Recommendations loaded"
        );

        state.applied_ticket = ticket;
        state.movies = RecommendationState {
            popular: popular_movies,
            recommended: recommended_movies,
        };
        state.books = RecommendationState {
            popular: popular_books,
            recommended: recommended_books,
        };
        state.refreshed_at = Some(Utc::now());

        Ok(())
    }

    /// Cached popular items of `kind` passing `filter`
    pub async fn filter_popular_by_language(
        &self,
        kind: MediaKind,
        filter: &LanguageFilter,
    ) -> Vec<Media> {
        match kind {
            MediaKind::Movie => self
                .popular_movies(filter)
                .await
                .into_iter()
                .map(Media::Movie)
                .collect(),
            MediaKind::Book => self
                .popular_books(filter)
                .await
                .into_iter()
                .map(Media::Book)
                .collect(),
        }
    }

    /// Cached popular movies passing `filter`
    pub async fn popular_movies(&self, filter: &LanguageFilter) -> Vec<Movie> {
        filter.apply(&self.state.read().await.movies.popular)
    }

    /// Cached popular books passing `filter`
    pub async fn popular_books(&self, filter: &LanguageFilter) -> Vec<Book> {
        filter.apply(&self.state.read().await.books.popular)
    }

    /// Stores a new language preference. Cached lists are left untouched.
    pub async fn set_language_preference(&self, language: LanguageFilter) {
        let mut state = self.state.write().await;
        state.language = language;
        tracing::debug!(language = %state.language, "Language preference updated");
        self.persist(StorageKey::PreferredLanguage, state.language.to_string())
            .await;
    }

    pub async fn language_preference(&self) -> LanguageFilter {
        self.state.read().await.language.clone()
    }

    pub async fn recently_viewed(&self) -> RecentlyViewed {
        let state = self.state.read().await;
        RecentlyViewed {
            movies: state.recent_movies.items().to_vec(),
            books: state.recent_books.items().to_vec(),
        }
    }

    pub async fn recommendations(&self) -> Recommendations {
        let state = self.state.read().await;
        Recommendations {
            movies: state.movies.recommended.clone(),
            books: state.books.recommended.clone(),
            is_loading: self.is_loading(),
            refreshed_at: state.refreshed_at,
        }
    }

    /// Whether any recommendation load is in flight
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    async fn persist(&self, key: StorageKey, value: String) {
        if let Err(e) = self.storage.set(key, value).await {
            tracing::error!(
                error = %e,
                key = %key,
                backend = self.storage.name(),
                "Failed to persist value"
            );
        }
    }
}

fn fallback<T: Clone>(popular: &[T]) -> Vec<T> {
    popular
        .iter()
        .take(FALLBACK_RECOMMENDATION_COUNT)
        .cloned()
        .collect()
}

fn load_failed(ticket: u64, error: AppError) -> AppError {
    tracing::error!(ticket = ticket, error = %error, "Error loading recommendations");
    AppError::RecommendationLoad(error.to_string())
}

async fn read_recency<T>(storage: &dyn KeyValueStore, key: StorageKey) -> RecencyList<T>
where
    T: Catalogued + DeserializeOwned,
{
    let raw = match storage.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return RecencyList::new(),
        Err(e) => {
            tracing::warn!(error = %e, key = %key, "Failed to read recently viewed items");
            return RecencyList::new();
        }
    };

    match serde_json::from_str::<Vec<T>>(&raw) {
        Ok(items) => RecencyList::from_items(items),
        Err(e) => {
            tracing::error!(
                error = %e,
                key = %key,
                "Failed to parse recently viewed items from storage"
            );
            RecencyList::new()
        }
    }
}
