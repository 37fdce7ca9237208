//! Static value cells owned by a producer.
//!
//! Producers mutate the backing buffer in place through `values_mut()` and
//! then call [`DataCell::notify_changed`], or use `update()` which does both.

use std::cell::{Cell, Ref, RefCell, RefMut};

use crate::cell::DataCell;
use crate::notify::Notifier;
use crate::shape::Shape;

/// A single owned `f64`.
#[derive(Debug, Default)]
pub struct ValScalar {
    value: RefCell<[f64; 1]>,
    changed: Notifier,
}

impl ValScalar {
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self {
            value: RefCell::new([value]),
            changed: Notifier::new(),
        }
    }

    #[must_use]
    pub fn get(&self) -> f64 {
        self.value.borrow()[0]
    }

    /// Store `value` and notify listeners.
    pub fn set(&self, value: f64) {
        self.value.borrow_mut()[0] = value;
        self.notify_changed();
    }
}

impl DataCell for ValScalar {
    fn shape(&self) -> Shape {
        Shape::Scalar
    }

    fn values(&self) -> Option<Ref<'_, [f64]>> {
        Some(Ref::map(self.value.borrow(), |v| &v[..]))
    }

    fn changed(&self) -> &Notifier {
        &self.changed
    }
}

/// An owned, resizable vector of `f64`.
#[derive(Debug, Default)]
pub struct ValVector {
    data: RefCell<Vec<f64>>,
    changed: Notifier,
}

impl ValVector {
    #[must_use]
    pub fn new(data: Vec<f64>) -> Self {
        Self {
            data: RefCell::new(data),
            changed: Notifier::new(),
        }
    }

    /// A zero-filled vector of `len` elements.
    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self::new(vec![0.0; len])
    }

    #[must_use]
    pub fn from_fn(len: usize, f: impl FnMut(usize) -> f64) -> Self {
        Self::new((0..len).map(f).collect())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mutable access to the backing buffer. Does not notify; call
    /// [`DataCell::notify_changed`] afterwards.
    ///
    /// # Panics
    ///
    /// Panics if the values are currently borrowed (for example from within
    /// a change listener that still holds `values()`).
    pub fn values_mut(&self) -> RefMut<'_, [f64]> {
        RefMut::map(self.data.borrow_mut(), Vec::as_mut_slice)
    }

    /// Mutate in place, then notify.
    pub fn update(&self, f: impl FnOnce(&mut [f64])) {
        f(&mut self.values_mut());
        self.notify_changed();
    }

    /// Change the length, zero-filling new elements, then notify.
    pub fn resize(&self, len: usize) {
        self.data.borrow_mut().resize(len, 0.0);
        self.notify_changed();
    }

    /// Replace the whole buffer, then notify.
    pub fn replace(&self, data: Vec<f64>) {
        *self.data.borrow_mut() = data;
        self.notify_changed();
    }
}

impl DataCell for ValVector {
    fn shape(&self) -> Shape {
        Shape::Vector(self.len())
    }

    fn values(&self) -> Option<Ref<'_, [f64]>> {
        Some(Ref::map(self.data.borrow(), Vec::as_slice))
    }

    fn changed(&self) -> &Notifier {
        &self.changed
    }
}

/// An owned row-major matrix of `f64`.
#[derive(Debug)]
pub struct ValMatrix {
    data: RefCell<Vec<f64>>,
    size: Cell<(usize, usize)>,
    changed: Notifier,
}

impl ValMatrix {
    /// # Panics
    ///
    /// Panics if `data.len() != rows * cols`.
    #[must_use]
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        assert_eq!(data.len(), rows * cols, "matrix buffer does not match {rows}x{cols}");
        Self {
            data: RefCell::new(data),
            size: Cell::new((rows, cols)),
            changed: Notifier::new(),
        }
    }

    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::new(rows, cols, vec![0.0; rows * cols])
    }

    /// Build from `f(row, col)`.
    #[must_use]
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                data.push(f(r, c));
            }
        }
        Self::new(rows, cols, data)
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.size.get().0
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.size.get().1
    }

    /// Mutable access to the row-major buffer. Does not notify.
    ///
    /// # Panics
    ///
    /// Panics if the values are currently borrowed.
    pub fn values_mut(&self) -> RefMut<'_, [f64]> {
        RefMut::map(self.data.borrow_mut(), Vec::as_mut_slice)
    }

    /// Mutate in place, then notify.
    pub fn update(&self, f: impl FnOnce(&mut [f64])) {
        f(&mut self.values_mut());
        self.notify_changed();
    }

    /// Change the size to `rows x cols` (contents reset to zero), then notify.
    pub fn resize(&self, rows: usize, cols: usize) {
        {
            let mut data = self.data.borrow_mut();
            data.clear();
            data.resize(rows * cols, 0.0);
        }
        self.size.set((rows, cols));
        self.notify_changed();
    }

    /// Replace size and contents, then notify.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != rows * cols`.
    pub fn replace(&self, rows: usize, cols: usize, data: Vec<f64>) {
        assert_eq!(data.len(), rows * cols, "matrix buffer does not match {rows}x{cols}");
        *self.data.borrow_mut() = data;
        self.size.set((rows, cols));
        self.notify_changed();
    }
}

impl DataCell for ValMatrix {
    fn shape(&self) -> Shape {
        let (rows, cols) = self.size.get();
        Shape::Matrix { rows, cols }
    }

    fn values(&self) -> Option<Ref<'_, [f64]>> {
        Some(Ref::map(self.data.borrow(), Vec::as_slice))
    }

    fn changed(&self) -> &Notifier {
        &self.changed
    }
}
