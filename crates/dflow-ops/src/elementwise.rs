//! Unary maps applied to every element.

use std::any::Any;

use dflow_core::{
    DataCell, DataError, Dims, Notifier, Operation, Result, Shape, ShapedBuffer, TaskData,
    downcast_task,
};

/// Applies `f(x)` to every element. Output shape equals input shape.
pub struct Elementwise {
    name: &'static str,
    func: fn(f64) -> f64,
    changed: Notifier<&'static str>,
}

impl std::fmt::Debug for Elementwise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Elementwise")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Elementwise {
    #[must_use]
    pub fn new(name: &'static str, func: fn(f64) -> f64) -> Self {
        Self {
            name,
            func,
            changed: Notifier::new(),
        }
    }

    /// Natural logarithm of every element.
    #[must_use]
    pub fn ln() -> Self {
        Self::new("ln", f64::ln)
    }

    #[must_use]
    pub fn abs() -> Self {
        Self::new("abs", f64::abs)
    }

    #[must_use]
    pub fn sqrt() -> Self {
        Self::new("sqrt", f64::sqrt)
    }
}

struct ElementwiseTask {
    func: fn(f64) -> f64,
    input: ShapedBuffer,
    output: ShapedBuffer,
}

impl TaskData for ElementwiseTask {
    fn compute(&mut self) -> Option<&[f64]> {
        let shape = self.input.shape()?;
        self.output.ensure(shape);
        let func = self.func;
        for (out, &x) in self
            .output
            .as_mut_slice()
            .iter_mut()
            .zip(self.input.as_slice())
        {
            *out = func(x);
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

impl Operation for Elementwise {
    fn name(&self) -> &'static str {
        self.name
    }

    fn thread_safe(&self) -> bool {
        true
    }

    fn size(&self, input: Shape) -> Result<Shape> {
        match input.dims() {
            Dims::Struct => Err(DataError::wrong_dims(self.name, Dims::Struct)),
            _ => Ok(input),
        }
    }

    fn prepare(
        &self,
        existing: Option<Box<dyn TaskData>>,
        input: &dyn DataCell,
    ) -> Result<Option<Box<dyn TaskData>>> {
        let out_shape = self.size(input.shape())?;
        let mut task = downcast_task::<ElementwiseTask>(existing).unwrap_or_else(|| {
            Box::new(ElementwiseTask {
                func: self.func,
                input: ShapedBuffer::new(),
                output: ShapedBuffer::new(),
            })
        });
        task.func = self.func;
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
