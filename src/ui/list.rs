//! The displayed list and the notifications it sends to the visual list.

use super::diff::{diff, EditScript, Keyed};

/// Receiver of incremental updates, e.g. a list widget's adapter.
/// Calls arrive in edit-script order; positions are valid at call time.
pub trait ListUpdateSink<T> {
    fn inserted(&mut self, index: usize, item: &T);
    fn removed(&mut self, index: usize);
    /// The row at `from` now lives at `to` (index in the list without it)
    fn moved(&mut self, from: usize, to: usize);
    fn changed(&mut self, index: usize, item: &T);
}

/// Holds what is on screen and turns each new sequence into an edit script
#[derive(Debug, Clone, Default)]
pub struct ListModel<T> {
    items: Vec<T>,
}

impl<T> ListModel<T>
where
    T: Keyed + Clone + PartialEq,
{
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replace the displayed sequence and return the edits that lead there
    pub fn submit(&mut self, new_items: &[T]) -> EditScript<T> {
        let script = diff(&self.items, new_items);
        self.items = new_items.to_vec();
        script
    }

    /// Like `submit`, and hand the edits straight to `sink`
    pub fn submit_to<S>(&mut self, new_items: &[T], sink: &mut S) -> EditScript<T>
    where
        S: ListUpdateSink<T> + ?Sized,
    {
        let script = self.submit(new_items);
        script.dispatch_to(sink);
        script
    }
}
