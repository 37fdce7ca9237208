//! Contiguous sub-ranges of vectors and sub-rectangles of matrices.
//!
//! The first (`start1`, `length1`) pair addresses the fast axis: elements of a
//! vector, columns of a matrix. The second pair addresses matrix rows and is
//! ignored for vectors. Ranges running past the end are truncated.

use std::any::Any;
use std::cell::Cell;

use dflow_core::{
    DataCell, DataError, Notifier, Operation, PropertyKind, PropertySource, PropertyValue, Result,
    Shape, ShapedBuffer, Subscription, TaskData, downcast_task,
};

use crate::subscribe_param;

const NAME: &str = "subset";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SubsetParams {
    start1: usize,
    length1: usize,
    start2: usize,
    length2: usize,
}

fn truncated(start: usize, length: usize, extent: usize) -> usize {
    length.min(extent.saturating_sub(start))
}

fn subset_shape(p: SubsetParams, input: Shape) -> Result<Shape> {
    match input {
        Shape::Vector(len) => Ok(Shape::Vector(truncated(p.start1, p.length1, len))),
        Shape::Matrix { rows, cols } => Ok(Shape::matrix(
            truncated(p.start2, p.length2, rows),
            truncated(p.start1, p.length1, cols),
        )),
        other => Err(DataError::wrong_dims(NAME, other.dims())),
    }
}

/// Selects a contiguous range (vector) or rectangle (matrix).
#[derive(Debug)]
pub struct SubsetOperation {
    params: Cell<SubsetParams>,
    changed: Notifier<&'static str>,
}

impl SubsetOperation {
    /// Vector subset of `length` elements starting at `start`.
    #[must_use]
    pub fn range(start: usize, length: usize) -> Self {
        Self::new(start, length, 0, 1)
    }

    /// Matrix subset: columns `start1..start1+length1`, rows
    /// `start2..start2+length2`.
    #[must_use]
    pub fn new(start1: usize, length1: usize, start2: usize, length2: usize) -> Self {
        Self {
            params: Cell::new(SubsetParams {
                start1,
                length1,
                start2,
                length2,
            }),
            changed: Notifier::new(),
        }
    }

    /// `(start1, length1, start2, length2)`.
    #[must_use]
    pub fn params(&self) -> (usize, usize, usize, usize) {
        let p = self.params.get();
        (p.start1, p.length1, p.start2, p.length2)
    }

    pub fn set_start1(&self, v: usize) {
        self.update("start1", |p| p.start1 = v);
    }

    pub fn set_length1(&self, v: usize) {
        self.update("length1", |p| p.length1 = v);
    }

    pub fn set_start2(&self, v: usize) {
        self.update("start2", |p| p.start2 = v);
    }

    pub fn set_length2(&self, v: usize) {
        self.update("length2", |p| p.length2 = v);
    }

    pub fn set_params(&self, start1: usize, length1: usize, start2: usize, length2: usize) {
        self.set_start1(start1);
        self.set_length1(length1);
        self.set_start2(start2);
        self.set_length2(length2);
    }

    fn update(&self, name: &'static str, f: impl FnOnce(&mut SubsetParams)) {
        let mut params = self.params.get();
        f(&mut params);
        if params != self.params.get() {
            self.params.set(params);
            self.changed.notify(&name);
        }
    }
}

struct SubsetTask {
    params: SubsetParams,
    input: ShapedBuffer,
    output: ShapedBuffer,
}

impl TaskData for SubsetTask {
    fn compute(&mut self) -> Option<&[f64]> {
        let shape = self.input.shape()?;
        let out_shape = subset_shape(self.params, shape).ok()?;
        if out_shape.is_empty() {
            return None;
        }
        self.output.ensure(out_shape);

        let p = self.params;
        let m = self.input.as_slice();
        let v = self.output.as_mut_slice();
        match (shape, out_shape) {
            (Shape::Vector(_), Shape::Vector(n)) => {
                v.copy_from_slice(&m[p.start1..p.start1 + n]);
            }
            (Shape::Matrix { cols, .. }, Shape::Matrix { rows: orows, cols: ocols }) => {
                for r in 0..orows {
                    let src = (r + p.start2) * cols + p.start1;
                    v[r * ocols..(r + 1) * ocols].copy_from_slice(&m[src..src + ocols]);
                }
            }
            _ => return None,
        }
        Some(self.output.as_slice())
    }

    fn output(&self) -> Option<&[f64]> {
        self.output.shape().map(|_| self.output.as_slice())
    }

    fn output_shape(&self) -> Shape {
        self.output.shape().unwrap_or(Shape::Vector(0))
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl Operation for SubsetOperation {
    fn name(&self) -> &'static str {
        NAME
    }

    fn thread_safe(&self) -> bool {
        true
    }

    fn size(&self, input: Shape) -> Result<Shape> {
        subset_shape(self.params.get(), input)
    }

    fn prepare(
        &self,
        existing: Option<Box<dyn TaskData>>,
        input: &dyn DataCell,
    ) -> Result<Option<Box<dyn TaskData>>> {
        let params = self.params.get();
        let out_shape = subset_shape(params, input.shape())?;
        if out_shape.is_empty() {
            return Ok(None);
        }
        let mut task = downcast_task::<SubsetTask>(existing).unwrap_or_else(|| {
            Box::new(SubsetTask {
                params,
                input: ShapedBuffer::new(),
                output: ShapedBuffer::new(),
            })
        });
        task.params = params;
        if task.input.capture(input).is_none() {
            return Ok(None);
        }
        task.output.ensure(out_shape);
        Ok(Some(task))
    }

    fn changed(&self) -> &Notifier<&'static str> {
        &self.changed
    }
}

impl PropertySource for SubsetOperation {
    fn property_kind(&self, name: &str) -> Option<PropertyKind> {
        self.property(name).map(|v| v.kind())
    }

    fn property(&self, name: &str) -> Option<PropertyValue> {
        let p = self.params.get();
        let v = match name {
            "start1" => p.start1,
            "length1" => p.length1,
            "start2" => p.start2,
            "length2" => p.length2,
            _ => return None,
        };
        Some(PropertyValue::U64(v as u64))
    }

    fn subscribe_property(&self, name: &str, listener: Box<dyn Fn()>) -> Subscription {
        subscribe_param(&self.changed, name, listener)
    }
}
