//! Shared data structures for the application state
//!
//! These structs represent the data model that flows between
//! the database layer, the pipeline and the UI layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Fixed set of categories an item can belong to
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemCategory {
    Food,
    Drinks,
    Household,
    Personal,
    #[default]
    Other,
}

impl ItemCategory {
    /// Every category, in the order the UI offers them
    pub const ALL: [ItemCategory; 5] = [
        ItemCategory::Food,
        ItemCategory::Drinks,
        ItemCategory::Household,
        ItemCategory::Personal,
        ItemCategory::Other,
    ];

    /// Name used in the database column (e.g. "FOOD")
    pub fn as_str(self) -> &'static str {
        match self {
            ItemCategory::Food => "FOOD",
            ItemCategory::Drinks => "DRINKS",
            ItemCategory::Household => "HOUSEHOLD",
            ItemCategory::Personal => "PERSONAL",
            ItemCategory::Other => "OTHER",
        }
    }

    /// Decode a stored name. Unknown names fall back to `Other`
    /// so a row written by a newer schema still loads.
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == name)
            .unwrap_or(ItemCategory::Other)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ItemCategory::Food => "Food",
            ItemCategory::Drinks => "Drinks",
            ItemCategory::Household => "Household",
            ItemCategory::Personal => "Personal",
            ItemCategory::Other => "Other",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            ItemCategory::Food => "🍎",
            ItemCategory::Drinks => "🥤",
            ItemCategory::Household => "🏠",
            ItemCategory::Personal => "💄",
            ItemCategory::Other => "📦",
        }
    }

    /// Label for chips and filter menus, e.g. "🍎 Food"
    pub fn display_name_with_emoji(self) -> String {
        format!("{} {}", self.emoji(), self.display_name())
    }
}

/// Represents a single entry on the shopping list
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ShoppingItem {
    /// Unique database ID (0 until the store assigns one)
    pub id: i64,
    /// What to buy, must not be blank
    pub name: String,
    /// How many, must be greater than zero
    pub quantity: i32,
    /// Whether the item has already been bought
    pub is_bought: bool,
    /// Unit price, never negative
    pub price: f64,
    pub category: ItemCategory,
    /// Creation time in milliseconds since the Unix epoch (0 until stamped by the store)
    pub timestamp: i64,
    pub notes: String,
}

impl ShoppingItem {
    /// Create a pending, unpersisted item with default price, category and notes
    pub fn new(name: impl Into<String>, quantity: i32) -> Self {
        Self {
            id: 0,
            name: name.into(),
            quantity,
            is_bought: false,
            price: 0.0,
            category: ItemCategory::Other,
            timestamp: 0,
            notes: String::new(),
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    pub fn with_category(mut self, category: ItemCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Unit price times quantity
    pub fn line_total(&self) -> f64 {
        self.price * self.quantity as f64
    }

    /// Check the validity invariant: non-blank name, positive quantity,
    /// non-negative price (NaN counts as negative)
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankName);
        }
        if self.quantity <= 0 {
            return Err(ValidationError::NonPositiveQuantity(self.quantity));
        }
        if !(self.price >= 0.0) {
            return Err(ValidationError::NegativePrice(self.price));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Creation time as a UTC date, `None` while unstamped
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        if self.timestamp == 0 {
            return None;
        }
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// Aggregate numbers shown in the summary header.
///
/// A derived snapshot: rebuilt from the item collection on every change,
/// never persisted or mutated in place.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct ShoppingStatistics {
    pub total_items: usize,
    pub bought_items: usize,
    pub pending_items: usize,
    /// Sum of line totals over bought items
    pub total_cost: f64,
    /// Sum of line totals over all items
    pub estimated_cost: f64,
}

impl ShoppingStatistics {
    /// Share of bought items in whole percent, 0 for an empty list
    pub fn completion_percentage(&self) -> u32 {
        if self.total_items == 0 {
            return 0;
        }
        (self.bought_items * 100 / self.total_items) as u32
    }

    /// What is still left to spend
    pub fn remaining_cost(&self) -> f64 {
        self.estimated_cost - self.total_cost
    }

    pub fn is_complete(&self) -> bool {
        self.total_items > 0 && self.bought_items == self.total_items
    }
}
