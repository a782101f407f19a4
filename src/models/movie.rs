use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{null_as_default, string_or_number, Catalogued, MediaKind};

/// A movie as returned by TMDB.
///
/// List endpoints and the details endpoint return different subsets of these
/// fields, so everything except `id` is optional or defaulted. Fields without
/// a typed counterpart are kept in `extra` and serialized back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>,
    /// Full genre objects (details endpoint only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<Genre>>,
    /// Genre ids (list endpoints only)
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub genre_ids: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub videos: Option<VideoList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<Credits>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Movie {
    /// Creates a movie with only an id and title set
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            overview: None,
            poster_path: None,
            backdrop_path: None,
            vote_average: None,
            vote_count: None,
            release_date: None,
            runtime: None,
            genres: None,
            genre_ids: Vec::new(),
            popularity: None,
            tagline: None,
            original_language: None,
            status: None,
            videos: None,
            credits: None,
            extra: Map::new(),
        }
    }

    /// First YouTube trailer, if TMDB returned one
    pub fn trailer(&self) -> Option<&Video> {
        self.videos
            .as_ref()?
            .results
            .iter()
            .find(|v| v.site == "YouTube" && v.video_type == "Trailer")
    }
}

impl Catalogued for Movie {
    const KIND: MediaKind = MediaKind::Movie;

    fn id(&self) -> &str {
        &self.id
    }

    fn language(&self) -> Option<&str> {
        self.original_language.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VideoList {
    #[serde(default)]
    pub results: Vec<Video>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    #[serde(default)]
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub site: String,
    #[serde(default, rename = "type")]
    pub video_type: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub profile_path: Option<String>,
    #[serde(default)]
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewMember {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub job: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_entry_deserialization() {
        let json = r#"{
            "adult": false,
            "id": 27205,
            "title": "Inception",
            "genre_ids": [28, 878, 12],
            "original_language": "en",
            "popularity": 83.952,
            "vote_average": 8.369,
            "vote_count": 36000,
            "release_date": "2010-07-15"
        }"#;

        let movie: Movie = serde_json::from_str(json).unwrap();
        assert_eq!(movie.id, "27205");
        assert_eq!(movie.title, "Inception");
        assert_eq!(movie.genre_ids, vec![28, 878, 12]);
        assert_eq!(movie.language(), Some("en"));
        assert_eq!(movie.vote_count, Some(36000));
        assert_eq!(movie.runtime, None);
        assert_eq!(movie.extra.get("adult"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_details_deserialization() {
        let json = r#"{
            "id": 27205,
            "title": "Inception",
            "runtime": 148,
            "tagline": "Your mind is the scene of the crime.",
            "genres": [{"id": 28, "name": "Action"}, {"id": 878, "name": "Science Fiction"}],
            "videos": {"results": [
                {"id": "a", "key": "k1", "name": "Teaser", "site": "YouTube", "type": "Teaser"},
                {"id": "b", "key": "k2", "name": "Official Trailer", "site": "YouTube", "type": "Trailer"}
            ]},
            "credits": {
                "cast": [{"id": 6193, "name": "Leonardo DiCaprio", "character": "Cobb", "order": 0}],
                "crew": [{"id": 525, "name": "Christopher Nolan", "job": "Director", "department": "Directing"}]
            }
        }"#;

        let movie: Movie = serde_json::from_str(json).unwrap();
        assert_eq!(movie.runtime, Some(148));
        let genre_names: Vec<&str> = movie
            .genres
            .iter()
            .flatten()
            .map(|g| g.name.as_str())
            .collect();
        assert_eq!(genre_names, vec!["Action", "Science Fiction"]);
        assert!(movie.genre_ids.is_empty());
        assert_eq!(movie.trailer().map(|v| v.key.as_str()), Some("k2"));

        let credits = movie.credits.unwrap();
        assert_eq!(credits.cast[0].name, "Leonardo DiCaprio");
        assert_eq!(credits.crew[0].job.as_deref(), Some("Director"));
    }

    #[test]
    fn test_string_id_accepted() {
        let movie: Movie = serde_json::from_str(r#"{"id": "27205"}"#).unwrap();
        assert_eq!(movie.id, "27205");
        assert_eq!(movie.title, "");
        assert_eq!(movie.language(), None);
    }

    #[test]
    fn test_serialization_keeps_provider_field_names() {
        let mut movie = Movie::new("603", "The Matrix");
        movie.original_language = Some("en".to_string());

        let value = serde_json::to_value(&movie).unwrap();
        assert_eq!(value["id"], "603");
        assert_eq!(value["original_language"], "en");
        assert!(value.get("overview").is_none());

        let back: Movie = serde_json::from_value(value).unwrap();
        assert_eq!(back, movie);
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let input = serde_json::json!({
            "id": "27205",
            "title": "Inception",
            "original_title": "Inception",
            "adult": false,
            "imdb_id": "tt1375666"
        });

        let movie: Movie = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(movie.extra.len(), 3);

        let output = serde_json::to_value(&movie).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_null_fields_are_treated_as_missing() {
        let json = r#"{
            "id": 550,
            "title": null,
            "vote_average": null,
            "vote_count": null,
            "popularity": null,
            "genre_ids": null
        }"#;

        let movie: Movie = serde_json::from_str(json).unwrap();
        assert_eq!(movie.id, "550");
        assert_eq!(movie.title, "");
        assert_eq!(movie.vote_average, None);
        assert!(movie.genre_ids.is_empty());

        let value = serde_json::to_value(&movie).unwrap();
        assert_eq!(value, serde_json::json!({ "id": "550" }));
    }
}
