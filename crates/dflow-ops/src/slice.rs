//! Row/column extraction and windowed reduction.
//!
//! # Windows
//!
//! A window of `width` centred on `index` covers
//! `[index - width/2, index + width/2]` clamped to the axis. A width of `-1`
//! covers the whole axis. Reductions sum the covered elements, or average
//! them when `average` is set.
//!
//! Indices past the end of the addressed axis are clamped to the last valid
//! position.

use std::any::Any;
use std::cell::Cell;
use std::ops::RangeInclusive;

use dflow_core::{
    DataCell, DataError, Dims, Notifier, Operation, PropertyKind, PropertySource, PropertyValue,
    Result, Shape, ShapedBuffer, Subscription, TaskData, downcast_task,
};

use crate::subscribe_param;

const NAME: &str = "slice";

/// What a slice extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliceMode {
    /// Matrix: one row. Vector: one element.
    Row,
    /// Matrix: one column.
    Col,
    /// Matrix: reduce a window of rows. Vector: reduce a window of elements.
    SumRows,
    /// Matrix: reduce a window of columns.
    SumCols,
}

impl SliceMode {
    /// Vector input: the element at `index`.
    pub const ELEMENT: Self = Self::Row;
    /// Vector input: reduce a window of elements.
    pub const SUM_ELEMENTS: Self = Self::SumRows;

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Row => "row",
            Self::Col => "col",
            Self::SumRows => "sum_rows",
            Self::SumCols => "sum_cols",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SliceParams {
    mode: SliceMode,
    index: usize,
    width: i32,
    average: bool,
}

/// Output shape of a slice, one dimension lower than the input.
fn slice_shape(mode: SliceMode, input: Shape) -> Result<Shape> {
    match (input, mode) {
        (Shape::Vector(_), SliceMode::Row | SliceMode::SumRows) => Ok(Shape::Scalar),
        (Shape::Vector(_), SliceMode::Col | SliceMode::SumCols) => {
            Err(DataError::UnsupportedMode {
                operation: NAME,
                mode: mode.name(),
                found: Dims::Vector,
            })
        }
        (Shape::Matrix { cols, .. }, SliceMode::Row | SliceMode::SumRows) => {
            Ok(Shape::Vector(cols))
        }
        (Shape::Matrix { rows, .. }, SliceMode::Col | SliceMode::SumCols) => {
            Ok(Shape::Vector(rows))
        }
        (other, _) => Err(DataError::wrong_dims(NAME, other.dims())),
    }
}

/// Window of `width` around `index` on an axis of `len > 0` elements.
pub(crate) fn window(index: usize, width: i32, len: usize) -> RangeInclusive<usize> {
    let last = len.saturating_sub(1);
    let Ok(width) = usize::try_from(width) else {
        return 0..=last;
    };
    let half = width / 2;
    let centre = index.min(last);
    centre.saturating_sub(half)..=centre.saturating_add(half).min(last)
}

#[allow(clippy::cast_precision_loss)]
fn reduce(values: impl Iterator<Item = f64>, average: bool) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if average && n > 0 { sum / n as f64 } else { sum }
}

/// Extracts a row, column or element, or reduces a window of them.
#[derive(Debug)]
pub struct SliceOperation {
    params: Cell<SliceParams>,
    changed: Notifier<&'static str>,
}

impl SliceOperation {
    /// # Panics
    ///
    /// Panics if `width < -1`.
    #[must_use]
    pub fn new(mode: SliceMode, index: usize, width: i32) -> Self {
        assert!(width >= -1, "slice width must be >= -1, got {width}");
        Self {
            params: Cell::new(SliceParams {
                mode,
                index,
                width,
                average: false,
            }),
            changed: Notifier::new(),
        }
    }

    /// Builder: average instead of summing the window.
    #[must_use]
    pub fn with_average(self, average: bool) -> Self {
        self.set_average(average);
        self
    }

    #[must_use]
    pub fn mode(&self) -> SliceMode {
        self.params.get().mode
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.params.get().index
    }

    #[must_use]
    pub fn width(&self) -> i32 {
        self.params.get().width
    }

    #[must_use]
    pub fn average(&self) -> bool {
        self.params.get().average
    }

    pub fn set_mode(&self, mode: SliceMode) {
        self.update("mode", |p| p.mode = mode);
    }

    pub fn set_index(&self, index: usize) {
        self.update("index", |p| p.index = index);
    }

    /// # Panics
    ///
    /// Panics if `width < -1`.
    pub fn set_width(&self, width: i32) {
        assert!(width >= -1, "slice width must be >= -1, got {width}");
        self.update("width", |p| p.width = width);
    }

    pub fn set_average(&self, average: bool) {
        self.update("average", |p| p.average = average);
    }

    /// Update mode, index and width together. Each parameter that actually
    /// changes is announced separately.
    ///
    /// # Panics
    ///
    /// Panics if `width < -1`.
    pub fn set_params(&self, mode: SliceMode, index: usize, width: i32) {
        self.set_mode(mode);
        self.set_index(index);
        self.set_width(width);
    }

    fn update(&self, name: &'static str, f: impl FnOnce(&mut SliceParams)) {
        let mut params = self.params.get();
        f(&mut params);
        if params != self.params.get() {
            self.params.set(params);
            self.changed.notify(&name);
        }
    }
}

struct SliceTask {
    params: SliceParams,
    input: ShapedBuffer,
    output: ShapedBuffer,
}

impl TaskData for SliceTask {
    fn compute(&mut self) -> Option<&[f64]> {
        let shape = self.input.shape()?;
        let out_shape = slice_shape(self.params.mode, shape).ok()?;
        self.output.ensure(out_shape);

        let SliceParams {
            mode,
            index,
            width,
            average,
        } = self.params;
        let m = self.input.as_slice();
        let v = self.output.as_mut_slice();

        match shape {
            Shape::Vector(len) => {
                v[0] = match mode {
                    SliceMode::Row => m[index.min(len - 1)],
                    _ => reduce(m[window(index, width, len)].iter().copied(), average),
                };
            }
            Shape::Matrix { rows, cols } => match mode {
                SliceMode::Row => {
                    let r = index.min(rows - 1);
                    v.copy_from_slice(&m[r * cols..(r + 1) * cols]);
                }
                SliceMode::Col => {
                    let c = index.min(cols - 1);
                    for (r, out) in v.iter_mut().enumerate() {
                        *out = m[r * cols + c];
                    }
                }
                SliceMode::SumRows => {
                    let span = window(index, width, rows);
                    for (c, out) in v.iter_mut().enumerate() {
                        *out = reduce(span.clone().map(|r| m[r * cols + c]), average);
                    }
                }
                SliceMode::SumCols => {
                    let span = window(index, width, cols);
                    for (r, out) in v.iter_mut().enumerate() {
                        let row = &m[r * cols..(r + 1) * cols];
                        *out = reduce(row[span.clone()].iter().copied(), average);
                    }
                }
            },
            Shape::Scalar | Shape::Struct => return None,
        }
        Some(self.output.as_slice())
    }

    fn output(&self) -> Option<&[f64]> {
        self.output.shape().map(|_| self.output.as_slice())
    }

    fn output_shape(&self) -> Shape {
        self.output.shape().unwrap_or(Shape::Scalar)
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl Operation for SliceOperation {
    fn name(&self) -> &'static str {
        NAME
    }

    fn thread_safe(&self) -> bool {
        true
    }

    fn size(&self, input: Shape) -> Result<Shape> {
        slice_shape(self.mode(), input)
    }

    fn prepare(
        &self,
        existing: Option<Box<dyn TaskData>>,
        input: &dyn DataCell,
    ) -> Result<Option<Box<dyn TaskData>>> {
        let params = self.params.get();
        let out_shape = slice_shape(params.mode, input.shape())?;
        let mut task = downcast_task::<SliceTask>(existing).unwrap_or_else(|| {
            Box::new(SliceTask {
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

impl PropertySource for SliceOperation {
    fn property_kind(&self, name: &str) -> Option<PropertyKind> {
        self.property(name).map(|v| v.kind())
    }

    fn property(&self, name: &str) -> Option<PropertyValue> {
        let p = self.params.get();
        match name {
            "mode" => Some(PropertyValue::Text(p.mode.name().to_owned())),
            "index" => Some(PropertyValue::U64(p.index as u64)),
            "width" => Some(PropertyValue::I32(p.width)),
            "average" => Some(PropertyValue::Bool(p.average)),
            _ => None,
        }
    }

    fn subscribe_property(&self, name: &str, listener: Box<dyn Fn()>) -> Subscription {
        subscribe_param(&self.changed, name, listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dflow_core::{ValMatrix, ValScalar, ValVector};
    use std::rc::Rc;

    fn run(op: &SliceOperation, input: &dyn DataCell) -> Vec<f64> {
        let mut task = op
            .prepare(None, input)
            .expect("prepare")
            .expect("non-degenerate");
        op.compute(task.as_mut()).expect("output").to_vec()
    }

    // ── Vector input ─────────────────────────────────────────────────────

    #[test]
    fn element_of_ramp() {
        let input = ValVector::from_fn(100, |i| i as f64);
        let op = SliceOperation::new(SliceMode::ELEMENT, 50, 1);
        assert_eq!(op.size(input.shape()), Ok(Shape::Scalar));
        assert_eq!(run(&op, &input), vec![50.0]);
    }

    #[test]
    fn element_index_clamped() {
        let input = ValVector::from_fn(10, |i| i as f64);
        let op = SliceOperation::new(SliceMode::ELEMENT, 500, 1);
        assert_eq!(run(&op, &input), vec![9.0]);
    }

    #[test]
    fn sum_elements_window() {
        let input = ValVector::from_fn(10, |i| i as f64);
        let op = SliceOperation::new(SliceMode::SUM_ELEMENTS, 5, 4);
        // [3, 7]
        assert_eq!(run(&op, &input), vec![25.0]);
        op.set_average(true);
        assert_eq!(run(&op, &input), vec![5.0]);
    }

    #[test]
    fn sum_elements_clamped_at_edges() {
        let input = ValVector::from_fn(10, |i| i as f64);
        let op = SliceOperation::new(SliceMode::SUM_ELEMENTS, 0, 4).with_average(true);
        // [0, 2]
        assert_eq!(run(&op, &input), vec![1.0]);
    }

    #[test]
    fn whole_vector_window() {
        let input = ValVector::from_fn(4, |i| i as f64);
        let op = SliceOperation::new(SliceMode::SUM_ELEMENTS, 0, -1);
        assert_eq!(run(&op, &input), vec![6.0]);
    }

    #[test]
    fn column_modes_reject_vector() {
        let op = SliceOperation::new(SliceMode::Col, 0, 1);
        assert!(matches!(
            op.size(Shape::Vector(4)),
            Err(DataError::UnsupportedMode { mode: "col", .. })
        ));
    }

    #[test]
    fn rejects_scalar() {
        let op = SliceOperation::new(SliceMode::Row, 0, 1);
        assert_eq!(
            op.prepare(None, &ValScalar::new(1.0)).err(),
            Some(DataError::wrong_dims("slice", Dims::Scalar))
        );
    }

    // ── Matrix input ─────────────────────────────────────────────────────

    fn grid() -> ValMatrix {
        // m[r][c] = 10r + c
        ValMatrix::from_fn(4, 5, |r, c| (10 * r + c) as f64)
    }

    #[test]
    fn row_and_col() {
        let m = grid();
        let row = SliceOperation::new(SliceMode::Row, 2, 1);
        assert_eq!(row.size(m.shape()), Ok(Shape::Vector(5)));
        assert_eq!(run(&row, &m), vec![20.0, 21.0, 22.0, 23.0, 24.0]);

        let col = SliceOperation::new(SliceMode::Col, 3, 1);
        assert_eq!(col.size(m.shape()), Ok(Shape::Vector(4)));
        assert_eq!(run(&col, &m), vec![3.0, 13.0, 23.0, 33.0]);
    }

    #[test]
    fn sum_rows_mean_matches_manual() {
        let m = grid();
        let op = SliceOperation::new(SliceMode::SumRows, 1, 2).with_average(true);
        // rows [0, 2]
        let out = run(&op, &m);
        assert_eq!(out, vec![10.0, 11.0, 12.0, 13.0, 14.0]);
    }

    #[test]
    fn sum_cols_whole_axis() {
        let m = grid();
        let op = SliceOperation::new(SliceMode::SumCols, 0, -1);
        let out = run(&op, &m);
        assert_eq!(out, vec![10.0, 60.0, 110.0, 160.0]);
    }

    // ── Parameters ───────────────────────────────────────────────────────

    #[test]
    fn setters_notify_changed_param_only() {
        let op = SliceOperation::new(SliceMode::Row, 0, 1);
        let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let _sub = op
            .changed()
            .subscribe(move |name| seen_clone.borrow_mut().push(*name));

        op.set_params(SliceMode::Row, 3, 1);
        op.set_index(3);
        op.set_width(5);
        assert_eq!(*seen.borrow(), vec!["index", "width"]);
    }

    #[test]
    #[should_panic(expected = "slice width must be >= -1")]
    fn width_below_minus_one_panics() {
        let _ = SliceOperation::new(SliceMode::SumRows, 0, -2);
    }

    #[test]
    fn exposes_properties() {
        let op = SliceOperation::new(SliceMode::Row, 7, 3);
        assert_eq!(op.property("index"), Some(PropertyValue::U64(7)));
        assert_eq!(op.property_kind("mode"), Some(PropertyKind::Text));
        assert_eq!(op.property("nope"), None);
    }

    #[test]
    fn window_bounds() {
        assert_eq!(window(5, 4, 10), 3..=7);
        assert_eq!(window(0, 4, 10), 0..=2);
        assert_eq!(window(9, 4, 10), 7..=9);
        assert_eq!(window(50, 1, 10), 9..=9);
        assert_eq!(window(3, -1, 10), 0..=9);
    }
}
