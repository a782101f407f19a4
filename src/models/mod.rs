use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;

pub mod book;
pub mod language;
pub mod movie;

pub use book::{Book, ImageLinks, IndustryIdentifier, VolumeInfo};
pub use language::LanguageFilter;
pub use movie::{CastMember, Credits, CrewMember, Genre, Movie, Video, VideoList};

/// Discriminator between the two item kinds the store tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Book,
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Movie => write!(f, "movie"),
            MediaKind::Book => write!(f, "book"),
        }
    }
}

/// Common view over provider entities
pub trait Catalogued {
    const KIND: MediaKind;

    /// Provider-assigned identifier
    fn id(&self) -> &str;

    /// Language code, if the provider reported one
    fn language(&self) -> Option<&str>;
}

/// A movie or a book, tagged with its kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "item", rename_all = "lowercase")]
pub enum Media {
    Movie(Movie),
    Book(Book),
}

impl Media {
    pub fn kind(&self) -> MediaKind {
        match self {
            Media::Movie(_) => MediaKind::Movie,
            Media::Book(_) => MediaKind::Book,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Media::Movie(movie) => movie.id(),
            Media::Book(book) => book.id(),
        }
    }
}

impl From<Movie> for Media {
    fn from(movie: Movie) -> Self {
        Media::Movie(movie)
    }
}

impl From<Book> for Media {
    fn from(book: Book) -> Self {
        Media::Book(book)
    }
}

/// Accepts identifiers sent either as JSON strings or numbers.
///
/// TMDB uses numeric ids while the rest of the application treats every
/// identifier as an opaque string.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Integer(n) => n.to_string(),
        RawId::Float(n) => n.to_string(),
    })
}

/// Treats an explicit JSON `null` the same as a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
