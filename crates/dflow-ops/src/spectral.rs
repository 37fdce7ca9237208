//! Magnitude and phase spectra of real vectors.
//!
//! The transform is the unnormalised forward DFT. Only the non-negative
//! frequency half, `N/2 + 1` bins, is published.

use std::any::Any;
use std::cell::Cell;
use std::sync::Arc;

use dflow_core::{
    DataCell, DataError, Notifier, Operation, PropertyKind, PropertySource, PropertyValue, Result,
    Shape, ShapedBuffer, Subscription, TaskData, downcast_task,
};
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use tracing::trace;

use crate::subscribe_param;

const NAME: &str = "spectral";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpectralMode {
    Magnitude,
    Phase,
}

impl SpectralMode {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Magnitude => "magnitude",
            Self::Phase => "phase",
        }
    }
}

fn spectral_shape(input: Shape) -> Result<Shape> {
    match input {
        Shape::Vector(n) => Ok(Shape::Vector(n / 2 + 1)),
        other => Err(DataError::wrong_dims(NAME, other.dims())),
    }
}

/// FFT of a real vector.
///
/// The transform plan is tied to the task's snapshot length, so this
/// operation is computed on the owning thread.
#[derive(Debug)]
pub struct SpectralOperation {
    mode: Cell<SpectralMode>,
    changed: Notifier<&'static str>,
}

impl SpectralOperation {
    #[must_use]
    pub fn new(mode: SpectralMode) -> Self {
        Self {
            mode: Cell::new(mode),
            changed: Notifier::new(),
        }
    }

    #[must_use]
    pub fn magnitude() -> Self {
        Self::new(SpectralMode::Magnitude)
    }

    #[must_use]
    pub fn phase() -> Self {
        Self::new(SpectralMode::Phase)
    }

    #[must_use]
    pub fn mode(&self) -> SpectralMode {
        self.mode.get()
    }

    pub fn set_mode(&self, mode: SpectralMode) {
        if self.mode.replace(mode) != mode {
            self.changed.notify(&"mode");
        }
    }
}

struct SpectralTask {
    mode: SpectralMode,
    input: ShapedBuffer,
    output: ShapedBuffer,
    plan: Option<Arc<dyn Fft<f64>>>,
    spectrum: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
}

impl SpectralTask {
    fn replan(&mut self, len: usize) {
        let plan = FftPlanner::new().plan_fft_forward(len);
        self.spectrum = vec![Complex::default(); len];
        self.scratch = vec![Complex::default(); plan.get_inplace_scratch_len()];
        self.plan = Some(plan);
        trace!(len, "spectral plan rebuilt");
    }
}

impl TaskData for SpectralTask {
    fn compute(&mut self) -> Option<&[f64]> {
        let plan = self.plan.as_ref()?;
        let n = plan.len();
        if self.input.len() != n || n == 0 {
            return None;
        }
        for (c, &x) in self.spectrum.iter_mut().zip(self.input.as_slice()) {
            *c = Complex::new(x, 0.0);
        }
        plan.process_with_scratch(&mut self.spectrum, &mut self.scratch);

        self.output.ensure(Shape::Vector(n / 2 + 1));
        let mode = self.mode;
        for (out, c) in self.output.as_mut_slice().iter_mut().zip(&self.spectrum) {
            *out = match mode {
                SpectralMode::Magnitude => c.norm(),
                SpectralMode::Phase => c.arg(),
            };
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

impl Operation for SpectralOperation {
    fn name(&self) -> &'static str {
        NAME
    }

    fn thread_safe(&self) -> bool {
        false
    }

    fn size(&self, input: Shape) -> Result<Shape> {
        spectral_shape(input)
    }

    fn prepare(
        &self,
        existing: Option<Box<dyn TaskData>>,
        input: &dyn DataCell,
    ) -> Result<Option<Box<dyn TaskData>>> {
        let out_shape = spectral_shape(input.shape())?;
        let mut task = downcast_task::<SpectralTask>(existing).unwrap_or_else(|| {
            Box::new(SpectralTask {
                mode: self.mode.get(),
                input: ShapedBuffer::new(),
                output: ShapedBuffer::new(),
                plan: None,
                spectrum: Vec::new(),
                scratch: Vec::new(),
            })
        });
        task.mode = self.mode.get();
        let Some(fresh) = task.input.capture(input) else {
            return Ok(None);
        };
        let len = task.input.len();
        if fresh || task.plan.as_ref().is_none_or(|p| p.len() != len) {
            task.replan(len);
        }
        task.output.ensure(out_shape);
        Ok(Some(task))
    }

    fn changed(&self) -> &Notifier<&'static str> {
        &self.changed
    }
}

impl PropertySource for SpectralOperation {
    fn property_kind(&self, name: &str) -> Option<PropertyKind> {
        self.property(name).map(|v| v.kind())
    }

    fn property(&self, name: &str) -> Option<PropertyValue> {
        (name == "mode").then(|| PropertyValue::Text(self.mode().name().to_owned()))
    }

    fn subscribe_property(&self, name: &str, listener: Box<dyn Fn()>) -> Subscription {
        subscribe_param(&self.changed, name, listener)
    }
}
