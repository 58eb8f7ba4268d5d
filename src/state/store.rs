//! The item store seam the pipeline is built against.

use std::sync::Arc;

use tokio::sync::watch;

use super::data::ShoppingItem;
use crate::error::Result;

/// Immutable point-in-time copy of the whole item collection
pub type Snapshot = Arc<Vec<ShoppingItem>>;

/// Durable collection of shopping items.
///
/// Mutations are serialized by the implementation; every committed mutation
/// publishes a fresh snapshot to all `observe_all` receivers.
pub trait ItemStore: Send + Sync + 'static {
    /// Live collection, ordered pending first then newest first
    fn observe_all(&self) -> watch::Receiver<Snapshot>;

    /// Current collection in the same order as `observe_all`
    fn get_all(&self) -> Result<Vec<ShoppingItem>>;

    fn get_by_id(&self, id: i64) -> Result<Option<ShoppingItem>>;

    /// Insert a new item, or replace the row when `item.id` is already set.
    /// Returns the row id.
    fn insert(&self, item: &ShoppingItem) -> Result<i64>;

    /// Insert a batch atomically: either every item is stored or none is,
    /// followed by a single snapshot. Returns the row ids in input order.
    fn insert_all(&self, items: &[ShoppingItem]) -> Result<Vec<i64>>;

    /// Overwrite an existing row. Returns false when no row has `item.id`.
    fn update(&self, item: &ShoppingItem) -> Result<bool>;

    /// Returns false when no row has `item.id`
    fn delete(&self, item: &ShoppingItem) -> Result<bool>;

    /// Remove every bought item, returns how many rows went away
    fn delete_all_bought(&self) -> Result<usize>;
}
