use crate::state::data::ShoppingItem;
use crate::state::query::QueryState;

/// Derive the displayed sequence: category filter, then search filter,
/// then a stable sort. Pure, the same inputs always give the same output.
pub fn project(items: &[ShoppingItem], query: &QueryState) -> Vec<ShoppingItem> {
    let mut visible: Vec<ShoppingItem> = items
        .iter()
        .filter(|item| query.matches_category(item))
        .filter(|item| query.matches_search(item))
        .cloned()
        .collect();

    query.sort.sort(&mut visible);
    visible
}
