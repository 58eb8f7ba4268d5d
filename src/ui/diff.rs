//! Keyed list diff for incremental list rendering.
//!
//! Compares the previously displayed sequence with the new one and produces
//! an edit script the visual list can replay instead of rebuilding itself.
//!
//! # Algorithm
//!
//! 1. Remove every old item whose key is gone (back to front)
//! 2. Keep the longest run of survivors that is already in the new relative
//!    order in place; move each other survivor right after its nearest kept
//!    predecessor in the new order
//! 3. Insert new keys at their final index (front to back)
//! 4. Update survivors whose contents changed, at their final index
//!
//! Replaying the edits in order on the old sequence yields the new one.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use log::warn;

use super::list::ListUpdateSink;
use crate::state::data::ShoppingItem;

/// Something with a stable identity across list versions
pub trait Keyed {
    type Key: Eq + Hash + Clone + Debug;

    fn key(&self) -> Self::Key;
}

impl Keyed for ShoppingItem {
    type Key = i64;

    fn key(&self) -> i64 {
        self.id
    }
}

/// One step of an edit script. Indices refer to the list as it is
/// when the step runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit<T> {
    Remove { index: usize },
    /// Take the item out at `from`, then insert it at `to` in the shortened list
    Move { from: usize, to: usize },
    Insert { index: usize, item: T },
    /// Same key, different contents
    Update { index: usize, item: T },
}

/// Ordered edits: removals, then moves, then inserts, then updates
#[derive(Debug, Clone, PartialEq)]
pub struct EditScript<T> {
    edits: Vec<Edit<T>>,
}

impl<T> Default for EditScript<T> {
    fn default() -> Self {
        Self { edits: Vec::new() }
    }
}

impl<T: Clone> EditScript<T> {
    pub fn edits(&self) -> &[Edit<T>] {
        &self.edits
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn removals(&self) -> usize {
        self.count(|edit| matches!(edit, Edit::Remove { .. }))
    }

    pub fn moves(&self) -> usize {
        self.count(|edit| matches!(edit, Edit::Move { .. }))
    }

    pub fn inserts(&self) -> usize {
        self.count(|edit| matches!(edit, Edit::Insert { .. }))
    }

    pub fn updates(&self) -> usize {
        self.count(|edit| matches!(edit, Edit::Update { .. }))
    }

    fn count(&self, pred: impl Fn(&Edit<T>) -> bool) -> usize {
        self.edits.iter().filter(|edit| pred(edit)).count()
    }

    /// Replay the script on `list`, which must hold the old sequence
    pub fn apply(&self, list: &mut Vec<T>) {
        for edit in &self.edits {
            match edit {
                Edit::Remove { index } => {
                    list.remove(*index);
                }
                Edit::Move { from, to } => {
                    let item = list.remove(*from);
                    list.insert(*to, item);
                }
                Edit::Insert { index, item } => list.insert(*index, item.clone()),
                Edit::Update { index, item } => list[*index] = item.clone(),
            }
        }
    }

    /// Send every edit to a visual list, in script order
    pub fn dispatch_to<S: ListUpdateSink<T> + ?Sized>(&self, sink: &mut S) {
        for edit in &self.edits {
            match edit {
                Edit::Remove { index } => sink.removed(*index),
                Edit::Move { from, to } => sink.moved(*from, *to),
                Edit::Insert { index, item } => sink.inserted(*index, item),
                Edit::Update { index, item } => sink.changed(*index, item),
            }
        }
    }
}

/// Compute the edit script turning `old` into `new`.
///
/// Keys are expected to be unique within each sequence. Duplicates are
/// logged and only the first occurrence keeps its identity; later ones are
/// treated as removed (old side) or inserted (new side).
pub fn diff<T>(old: &[T], new: &[T]) -> EditScript<T>
where
    T: Keyed + Clone + PartialEq,
{
    let old_index = index_by_key(old, "previous");
    let new_index = index_by_key(new, "new");
    let mut edits = Vec::new();

    // An old item survives when it is the tracked occurrence of a key that is still present
    let survives = |i: usize, item: &T| {
        let key = item.key();
        old_index.get(&key) == Some(&i) && new_index.contains_key(&key)
    };
    // A new item is kept (not inserted) when it is the tracked occurrence of a surviving key
    let kept = |j: usize, item: &T| {
        let key = item.key();
        new_index.get(&key) == Some(&j) && old_index.contains_key(&key)
    };

    // Removals, back to front so earlier indices stay valid
    for (i, item) in old.iter().enumerate().rev() {
        if !survives(i, item) {
            edits.push(Edit::Remove { index: i });
        }
    }

    let mut work: Vec<T::Key> = old
        .iter()
        .enumerate()
        .filter(|(i, item)| survives(*i, *item))
        .map(|(_, item)| item.key())
        .collect();

    // Survivors already in the new relative order stay where they are
    let targets: Vec<usize> = work.iter().map(|key| new_index[key]).collect();
    let in_order = longest_increasing(&targets);
    let stable: HashMap<T::Key, bool> = work.iter().cloned().zip(in_order).collect();

    let mut anchor: Option<T::Key> = None;
    for (j, item) in new.iter().enumerate() {
        if !kept(j, item) {
            continue;
        }
        let key = item.key();
        if !stable.get(&key).copied().unwrap_or(false) {
            if let Some((from, to)) = move_after(&work, &key, anchor.as_ref()) {
                let moved = work.remove(from);
                work.insert(to, moved);
                edits.push(Edit::Move { from, to });
            }
        }
        anchor = Some(key);
    }

    for (j, item) in new.iter().enumerate() {
        if !kept(j, item) {
            edits.push(Edit::Insert {
                index: j,
                item: item.clone(),
            });
        }
    }

    for (j, item) in new.iter().enumerate() {
        if kept(j, item) && old[old_index[&item.key()]] != *item {
            edits.push(Edit::Update {
                index: j,
                item: item.clone(),
            });
        }
    }

    EditScript { edits }
}

/// Map each key to the position of its first occurrence
fn index_by_key<T: Keyed>(items: &[T], side: &str) -> HashMap<T::Key, usize> {
    let mut index = HashMap::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let key = item.key();
        if index.contains_key(&key) {
            warn!("Duplicate key {:?} in {} list at position {}", key, side, i);
            continue;
        }
        index.insert(key, i);
    }
    index
}

/// Where `key` has to go to sit right after `anchor` (or at the front).
/// `None` when it is already there.
fn move_after<K: PartialEq>(work: &[K], key: &K, anchor: Option<&K>) -> Option<(usize, usize)> {
    let from = work.iter().position(|k| k == key)?;
    let to = match anchor {
        None => 0,
        Some(anchor) => {
            let at = work.iter().position(|k| k == anchor)?;
            // Removing `key` first shifts the anchor left when it sat behind it
            if from > at {
                at + 1
            } else {
                at
            }
        }
    };
    (from != to).then_some((from, to))
}

/// Mark the members of one longest strictly increasing subsequence
fn longest_increasing(values: &[usize]) -> Vec<bool> {
    // tails[k] = index of the smallest tail of an increasing run of length k + 1
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; values.len()];

    for (i, &value) in values.iter().enumerate() {
        let slot = tails.partition_point(|&t| values[t] < value);
        if slot > 0 {
            prev[i] = Some(tails[slot - 1]);
        }
        if slot == tails.len() {
            tails.push(i);
        } else {
            tails[slot] = i;
        }
    }

    let mut member = vec![false; values.len()];
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        member[i] = true;
        cursor = prev[i];
    }
    member
}
