//! Struct cells: a named mapping of sub-cells.
//!
//! Struct cells sit outside the computation core. They group related cells
//! (an image plus its axes, a spectrum plus its frequency scale) so they can
//! be snapshotted and handed to a writer as one unit. Operations refuse them.

use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;

use crate::cell::{Data, DataCell};
use crate::notify::Notifier;
use crate::shape::Shape;

/// Named collection of data cells.
///
/// Membership changes notify the struct's own listeners. Value changes of
/// members are *not* forwarded; subscribe to the member directly.
#[derive(Default)]
pub struct StructData {
    members: RefCell<BTreeMap<String, Data>>,
    changed: Notifier,
}

impl std::fmt::Debug for StructData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructData")
            .field("members", &self.names())
            .finish()
    }
}

impl StructData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace member `name`, returning the previous cell.
    pub fn insert(&self, name: impl Into<String>, cell: Data) -> Option<Data> {
        let previous = self.members.borrow_mut().insert(name.into(), cell);
        self.notify_changed();
        previous
    }

    pub fn remove(&self, name: &str) -> Option<Data> {
        let removed = self.members.borrow_mut().remove(name);
        if removed.is_some() {
            self.notify_changed();
        }
        removed
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Data> {
        self.members.borrow().get(name).cloned()
    }

    /// Member names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.members.borrow().keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.borrow().is_empty()
    }

    /// Visit every member in name order.
    pub fn for_each(&self, mut f: impl FnMut(&str, &Data)) {
        for (name, cell) in self.members.borrow().iter() {
            f(name, cell);
        }
    }
}

impl DataCell for StructData {
    fn shape(&self) -> Shape {
        Shape::Struct
    }

    fn values(&self) -> Option<Ref<'_, [f64]>> {
        None
    }

    fn changed(&self) -> &Notifier {
        &self.changed
    }

    fn as_struct(&self) -> Option<&StructData> {
        Some(self)
    }
}
