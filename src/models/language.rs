use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{convert::Infallible, fmt::Display, str::FromStr};

use super::Catalogued;

const ALL_SENTINEL: &str = "all";

/// Language selection applied to popular lists
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LanguageFilter {
    /// No filtering
    #[default]
    All,
    /// Only items whose language equals this code
    Code(String),
}

impl LanguageFilter {
    /// Whether an item with the given language passes this filter.
    ///
    /// An absent language never matches a specific code.
    pub fn matches(&self, language: Option<&str>) -> bool {
        match self {
            LanguageFilter::All => true,
            LanguageFilter::Code(code) => language == Some(code.as_str()),
        }
    }

    /// Returns the items passing this filter, in their original order
    pub fn apply<T: Catalogued + Clone>(&self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .filter(|item| self.matches(item.language()))
            .cloned()
            .collect()
    }
}

impl FromStr for LanguageFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ALL_SENTINEL) {
            Ok(LanguageFilter::All)
        } else {
            Ok(LanguageFilter::Code(trimmed.to_string()))
        }
    }
}

impl Display for LanguageFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LanguageFilter::All => write!(f, "{}", ALL_SENTINEL),
            LanguageFilter::Code(code) => write!(f, "{}", code),
        }
    }
}

impl Serialize for LanguageFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LanguageFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or_default())
    }
}
