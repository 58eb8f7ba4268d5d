//! Transient list query: search text, sort order and category filter.

use super::data::{ItemCategory, ShoppingItem};
use super::sort::SortOption;

/// The three independent inputs a session combines with the stored items.
/// Lives as long as the session, never persisted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryState {
    /// Free text; blank means no filtering
    pub search: String,
    pub sort: SortOption,
    /// `None` shows every category
    pub category: Option<ItemCategory>,
}

impl QueryState {
    pub fn new(search: impl Into<String>, sort: SortOption, category: Option<ItemCategory>) -> Self {
        Self {
            search: search.into(),
            sort,
            category,
        }
    }

    /// Category filter, `None` always matches
    pub fn matches_category(&self, item: &ShoppingItem) -> bool {
        self.category.map_or(true, |category| item.category == category)
    }

    /// Case-insensitive substring match on name or notes.
    /// Blank search text matches everything.
    pub fn matches_search(&self, item: &ShoppingItem) -> bool {
        if self.search.trim().is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        item.name.to_lowercase().contains(&needle) || item.notes.to_lowercase().contains(&needle)
    }
}
