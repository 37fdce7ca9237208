#![forbid(unsafe_code)]

//! The operation capability set and per-binding task data.
//!
//! # Design
//!
//! An [`Operation`] is a parameterised, stateless descriptor. Everything that
//! depends on a particular input (the input snapshot, the output buffer, a
//! transform plan, a copy of the parameters) lives in a [`TaskData`] value
//! owned by the derived binding. `prepare` refreshes the task from a live
//! input cell; `compute` reads only the task, so a task can be moved to a
//! worker thread, computed there and moved back.
//!
//! # Invariants
//!
//! 1. `size(shape)` equals the shape of the buffer `compute` returns for a
//!    task prepared from an input of that shape.
//! 2. `compute` never touches the input cell.
//! 3. `prepare` reallocates task buffers only when a relevant shape changed.

use std::any::Any;
use std::rc::Rc;

use crate::cell::DataCell;
use crate::error::Result;
use crate::notify::Notifier;
use crate::shape::Shape;

/// Per-binding working state of an operation: input snapshot, output buffer,
/// parameter copy and any operation-private resources.
pub trait TaskData: Send + 'static {
    /// Run the transformation from the snapshot into the output buffer.
    ///
    /// Returns `None` when the snapshot cannot produce an output.
    fn compute(&mut self) -> Option<&[f64]>;

    /// Output of the last `compute`, if any.
    fn output(&self) -> Option<&[f64]>;

    /// Shape of the output buffer.
    fn output_shape(&self) -> Shape;

    /// Type-erased ownership, for reuse in `prepare`.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// Recover a concrete task type from an existing type-erased task.
///
/// A task of a different type is dropped and `None` returned, so `prepare`
/// falls back to a fresh allocation.
#[must_use]
pub fn downcast_task<T: TaskData>(existing: Option<Box<dyn TaskData>>) -> Option<Box<T>> {
    existing.and_then(|task| task.into_any().downcast::<T>().ok())
}

/// A pure transformation from one input shape to one output shape.
pub trait Operation {
    /// Short name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Whether `compute` may run on a worker thread against the snapshot.
    fn thread_safe(&self) -> bool;

    /// Output shape for an input of shape `input`.
    ///
    /// Fails with [`DataError::WrongDims`](crate::DataError::WrongDims) when
    /// the operation does not accept that dimensionality.
    fn size(&self, input: Shape) -> Result<Shape>;

    /// Create or refresh task data for `input`.
    ///
    /// `existing` is the task returned by a previous call (or `None` on first
    /// use). Returns `Ok(None)` for degenerate input.
    fn prepare(
        &self,
        existing: Option<Box<dyn TaskData>>,
        input: &dyn DataCell,
    ) -> Result<Option<Box<dyn TaskData>>>;

    /// Run the operation on prepared task data.
    fn compute<'t>(&self, task: &'t mut dyn TaskData) -> Option<&'t [f64]> {
        task.compute()
    }

    /// Release task buffers and private resources.
    fn release(&self, task: Box<dyn TaskData>) {
        drop(task);
    }

    /// Parameter-change channel. The payload is the parameter name.
    fn changed(&self) -> &Notifier<&'static str>;
}

/// Shared handle to an operation.
pub type OperationRef = Rc<dyn Operation>;
