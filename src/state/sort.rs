//! Sort orders offered in the "Sort By" menu.
//!
//! Each option maps to a plain comparator function through a lookup,
//! all sorts go through `slice::sort_by` and are therefore stable.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::data::ShoppingItem;

/// Comparator used by a sort option
pub type Comparator = fn(&ShoppingItem, &ShoppingItem) -> Ordering;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOption {
    /// Newest first (creation timestamp descending)
    #[default]
    DateDesc,
    DateAsc,
    NameAsc,
    NameDesc,
    /// Unit price ascending, not line total
    PriceAsc,
    PriceDesc,
    PendingFirst,
    BoughtFirst,
}

impl SortOption {
    /// Every option, in menu order
    pub const ALL: [SortOption; 8] = [
        SortOption::DateDesc,
        SortOption::DateAsc,
        SortOption::NameAsc,
        SortOption::NameDesc,
        SortOption::PriceAsc,
        SortOption::PriceDesc,
        SortOption::PendingFirst,
        SortOption::BoughtFirst,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            SortOption::DateDesc => "Newest First",
            SortOption::DateAsc => "Oldest First",
            SortOption::NameAsc => "Name A-Z",
            SortOption::NameDesc => "Name Z-A",
            SortOption::PriceAsc => "Price Low-High",
            SortOption::PriceDesc => "Price High-Low",
            SortOption::PendingFirst => "Pending First",
            SortOption::BoughtFirst => "Bought First",
        }
    }

    pub fn comparator(self) -> Comparator {
        match self {
            SortOption::DateDesc => |a, b| b.timestamp.cmp(&a.timestamp),
            SortOption::DateAsc => |a, b| a.timestamp.cmp(&b.timestamp),
            SortOption::NameAsc => |a, b| compare_names(a, b),
            SortOption::NameDesc => |a, b| compare_names(b, a),
            SortOption::PriceAsc => |a, b| a.price.total_cmp(&b.price),
            SortOption::PriceDesc => |a, b| b.price.total_cmp(&a.price),
            // false < true, so pending items come first
            SortOption::PendingFirst => |a, b| a.is_bought.cmp(&b.is_bought),
            SortOption::BoughtFirst => |a, b| b.is_bought.cmp(&a.is_bought),
        }
    }

    /// Sort in place. Equal keys keep their relative order.
    pub fn sort(self, items: &mut [ShoppingItem]) {
        items.sort_by(self.comparator());
    }
}

fn compare_names(a: &ShoppingItem, b: &ShoppingItem) -> Ordering {
    a.name.to_lowercase().cmp(&b.name.to_lowercase())
}
