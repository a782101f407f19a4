use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{null_as_default, Catalogued, MediaKind};

/// A volume as returned by Google Books.
///
/// `volume_info` and most fields inside it can be missing; the accessor
/// methods resolve those to the fallbacks used by recommendation queries.
/// Untyped fields such as `kind` or `saleInfo` are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_info: Option<VolumeInfo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Book {
    pub fn new(id: impl Into<String>, volume_info: Option<VolumeInfo>) -> Self {
        Self {
            id: id.into(),
            volume_info,
            extra: Map::new(),
        }
    }

    /// Title, or an empty string when absent
    pub fn title(&self) -> &str {
        self.volume_info
            .as_ref()
            .map(|info| info.title.as_str())
            .unwrap_or_default()
    }

    /// First listed category, or an empty string
    pub fn first_category(&self) -> &str {
        self.volume_info
            .as_ref()
            .and_then(|info| info.categories.as_ref())
            .and_then(|categories| categories.first())
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// First listed author, or an empty string
    pub fn first_author(&self) -> &str {
        self.volume_info
            .as_ref()
            .and_then(|info| info.authors.as_ref())
            .and_then(|authors| authors.first())
            .map(String::as_str)
            .unwrap_or_default()
    }
}

impl Catalogued for Book {
    const KIND: MediaKind = MediaKind::Book;

    fn id(&self) -> &str {
        &self.id
    }

    fn language(&self) -> Option<&str> {
        self.volume_info.as_ref()?.language.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratings_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_links: Option<ImageLinks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry_identifiers: Option<Vec<IndustryIdentifier>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small_thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryIdentifier {
    #[serde(rename = "type")]
    pub identifier_type: String,
    pub identifier: String,
}
