//! The data cell contract.

use std::cell::Ref;
use std::rc::Rc;

use crate::error::{DataError, Result};
use crate::notify::{Notifier, Subscription};
use crate::shape::{Dims, Shape};
use crate::structure::StructData;

/// Shared handle to any data cell.
pub type Data = Rc<dyn DataCell>;

/// An observable container for numeric data.
///
/// # Invariants
///
/// 1. The slice returned by [`values`](DataCell::values) always has exactly
///    `shape().len()` elements.
/// 2. After a shape change the cache is repopulated before values are read.
/// 3. [`notify_changed`](DataCell::notify_changed) only fans out; it never
///    recomputes anything itself.
pub trait DataCell {
    /// Current shape. For derived cells this is the last published shape.
    fn shape(&self) -> Shape;

    /// Dimensionality tag. Fixed for the lifetime of the cell.
    fn dims(&self) -> Dims {
        self.shape().dims()
    }

    /// Current values in row-major order, populating the cache if stale.
    ///
    /// `None` means no value is available (no input yet, degenerate input,
    /// or a struct cell).
    fn values(&self) -> Option<Ref<'_, [f64]>>;

    /// Single element at `index` (empty for scalars, `[i]` for vectors,
    /// `[row, col]` for matrices).
    fn value(&self, index: &[usize]) -> Result<f64> {
        let values = self.values().ok_or(DataError::NoValue)?;
        // Shape read after values() so a lazily refreshed shape is used.
        let shape = self.shape();
        let expected = shape.extents().len();
        if index.len() != expected {
            return Err(DataError::IndexArity {
                expected,
                got: index.len(),
                shape,
            });
        }
        let offset = shape.offset(index).ok_or_else(|| DataError::OutOfRange {
            index: index.to_vec(),
            shape,
        })?;
        values.get(offset).copied().ok_or(DataError::NoValue)
    }

    /// The change-notification channel of this cell.
    fn changed(&self) -> &Notifier;

    /// Announce that the backing values (or shape) changed.
    fn notify_changed(&self) {
        self.changed().notify(&());
    }

    /// Downcast hook for struct cells.
    fn as_struct(&self) -> Option<&StructData> {
        None
    }
}

/// Subscribe `listener` to change notifications of `cell`.
///
/// The listener stays registered until the returned guard is dropped.
pub fn on_changed(cell: &dyn DataCell, listener: impl Fn() + 'static) -> Subscription {
    cell.changed().subscribe(move |()| listener())
}

/// Read a scalar cell. `None` if no value is available or the cell is not
/// scalar.
#[must_use]
pub fn scalar_value(cell: &dyn DataCell) -> Option<f64> {
    if cell.dims() != Dims::Scalar {
        return None;
    }
    cell.values().and_then(|v| v.first().copied())
}
