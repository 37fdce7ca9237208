//! Reusable working buffers tagged with the shape they were sized for.

use tracing::warn;

use crate::cell::DataCell;
use crate::shape::Shape;

/// An owned `f64` buffer that is reallocated only when its shape changes.
///
/// Task data keeps one of these for the input snapshot and one for the
/// output, so steady-state updates with an unchanged shape never allocate.
#[derive(Debug, Clone, Default)]
pub struct ShapedBuffer {
    data: Vec<f64>,
    shape: Option<Shape>,
    allocations: usize,
}

impl ShapedBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Size the buffer for `shape`. Returns `true` when a fresh allocation
    /// was made; existing contents are kept otherwise.
    pub fn ensure(&mut self, shape: Shape) -> bool {
        if self.shape == Some(shape) {
            return false;
        }
        self.data = vec![0.0; shape.len()];
        self.shape = Some(shape);
        self.allocations += 1;
        true
    }

    /// Copy `src` in, sizing for `shape` first. Returns whether the buffer
    /// was reallocated.
    ///
    /// # Panics
    ///
    /// Panics if `src.len() != shape.len()`.
    pub fn copy_from(&mut self, shape: Shape, src: &[f64]) -> bool {
        let fresh = self.ensure(shape);
        self.data.copy_from_slice(src);
        fresh
    }

    /// Copy the current values of `input` into the buffer.
    ///
    /// Returns `None` when the input has no value or is degenerate (zero
    /// elements); otherwise whether a fresh allocation was made.
    pub fn capture(&mut self, input: &dyn DataCell) -> Option<bool> {
        let values = input.values()?;
        let shape = input.shape();
        if shape.is_empty() {
            return None;
        }
        if values.len() != shape.len() {
            warn!(%shape, len = values.len(), "input values disagree with reported shape");
            return None;
        }
        Some(self.copy_from(shape, &values))
    }

    /// Shape the buffer was last sized for.
    #[must_use]
    pub fn shape(&self) -> Option<Shape> {
        self.shape
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of allocations made over the buffer's lifetime.
    #[must_use]
    pub fn allocations(&self) -> usize {
        self.allocations
    }
}
