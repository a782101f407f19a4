use serde::{Deserialize, Serialize};

use crate::models::Catalogued;

/// Maximum number of entries kept per kind
pub const RECENCY_LIMIT: usize = 10;

/// Most-recent-first list of viewed items of one kind.
///
/// Holds at most [`RECENCY_LIMIT`] entries with unique ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecencyList<T> {
    items: Vec<T>,
}

impl<T> Default for RecencyList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Catalogued> RecencyList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from persisted entries, re-applying the dedupe and size
    /// bound in case the stored value was written by something else.
    pub fn from_items(items: Vec<T>) -> Self {
        let mut list = Self::new();
        for item in items.into_iter().rev() {
            list.record(item);
        }
        list
    }

    /// Moves `item` to the front, dropping any earlier entry with the same id
    /// and the oldest entries beyond the limit.
    pub fn record(&mut self, item: T) {
        self.items.retain(|existing| existing.id() != item.id());
        self.items.insert(0, item);
        self.items.truncate(RECENCY_LIMIT);
    }

    /// Most recently viewed item
    pub fn head(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
