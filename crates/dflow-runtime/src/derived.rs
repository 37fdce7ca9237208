#![forbid(unsafe_code)]

//! Derived cells: an operation bound to an input cell, republished as a new
//! observable cell.
//!
//! # Design
//!
//! A [`Derived<K>`] owns its binding: the operation, the input and its
//! subscription, the task data, the autorun flag and the Idle/Running state.
//! The output kind `K` fixes the dimensionality of the cell.
//!
//! On an input change:
//!
//! | state   | autorun | op thread-safe | effect                                    |
//! |---------|---------|----------------|-------------------------------------------|
//! | Running | any     | any            | dropped, counted in `dropped_updates()`   |
//! | Idle    | false   | any            | shape re-derived, cache invalidated, notify |
//! | Idle    | true    | false          | prepare + compute now, notify             |
//! | Idle    | true    | true           | prepare now, compute on the context, notify on completion |
//!
//! Detaching the input (`set_input(None)`) clears the value and shape on
//! every path, releases the task data and notifies.
//!
//! Values are computed lazily on read when the cache is stale and the binding
//! is Idle. While Running, reads return the previous result (or `None` if
//! there is none).
//!
//! # Invariants
//!
//! 1. At most one compute per cell is in flight.
//! 2. The task data is owned by exactly one of: the binding, a worker, the
//!    context's completion queue.
//! 3. The published shape and the value cache change together, on the owning
//!    thread.
//!
//! # Failure Modes
//!
//! - **Superseded completion**: the input was replaced while Running. The
//!   result is discarded and a cycle runs for the new input.
//! - **Panicking compute**: logged; the cell returns to Idle, keeps its
//!   previous cache and does not notify.
//! - **Cache borrowed during a synchronous recompute**: the result is not
//!   written; the cache is marked stale and refreshed on the next read.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use dflow_core::{
    Data, DataCell, DataError, Dims, Notifier, OperationRef, Result, Shape, ShapedBuffer,
    Subscription, TaskData, on_changed,
};
use tracing::{debug, trace, warn};

use crate::context::MainContext;
use crate::pool::Outcome;

/// Output dimensionality of a derived cell.
pub trait DerivedKind: 'static {
    const DIMS: Dims;
    const NAME: &'static str;
}

#[derive(Debug)]
pub struct ScalarKind;
#[derive(Debug)]
pub struct VectorKind;
#[derive(Debug)]
pub struct MatrixKind;

impl DerivedKind for ScalarKind {
    const DIMS: Dims = Dims::Scalar;
    const NAME: &'static str = "scalar";
}

impl DerivedKind for VectorKind {
    const DIMS: Dims = Dims::Vector;
    const NAME: &'static str = "vector";
}

impl DerivedKind for MatrixKind {
    const DIMS: Dims = Dims::Matrix;
    const NAME: &'static str = "matrix";
}

pub type DerivedScalar = Derived<ScalarKind>;
pub type DerivedVector = Derived<VectorKind>;
pub type DerivedMatrix = Derived<MatrixKind>;

/// Binding state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Idle,
    Running,
}

struct Binding {
    input: Option<Data>,
    input_sub: Option<Subscription>,
    op_sub: Option<Subscription>,
    task: Option<Box<dyn TaskData>>,
    autorun: bool,
    state: BindingState,
    shape: Shape,
    cache_valid: bool,
    /// Bumped whenever the input is replaced.
    epoch: u64,
    /// A parameter changed while Running.
    pending_refresh: bool,
    dropped_updates: u64,
}

/// A data cell computed from an input cell by an operation.
pub struct Derived<K: DerivedKind> {
    this: Weak<Self>,
    ctx: MainContext,
    op: OperationRef,
    binding: RefCell<Binding>,
    cache: RefCell<ShapedBuffer>,
    changed: Notifier,
    _kind: PhantomData<K>,
}

impl<K: DerivedKind> fmt::Debug for Derived<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.binding.borrow();
        f.debug_struct("Derived")
            .field("kind", &K::NAME)
            .field("op", &self.op.name())
            .field("state", &b.state)
            .field("autorun", &b.autorun)
            .field("shape", &b.shape)
            .field("cache_valid", &b.cache_valid)
            .finish_non_exhaustive()
    }
}

impl<K: DerivedKind> Derived<K> {
    /// Bind `op` to `input` on the calling thread's default context.
    pub fn new(input: Option<Data>, op: OperationRef) -> Result<Rc<Self>> {
        Self::with_context(input, op, &MainContext::thread_default())
    }

    /// Bind `op` to `input` on `ctx`.
    ///
    /// Fails with [`DataError::OutputDims`] if `op` applied to `input` does not
    /// produce `K`'s dimensionality, or with the operation's own error if it
    /// rejects the input.
    pub fn with_context(
        input: Option<Data>,
        op: OperationRef,
        ctx: &MainContext,
    ) -> Result<Rc<Self>> {
        if let Some(input) = &input {
            Self::check_output(&op, input.as_ref())?;
        }
        let autorun = ctx.config().autorun;
        let cell = Rc::new_cyclic(|this| Self {
            this: this.clone(),
            ctx: ctx.clone(),
            op: Rc::clone(&op),
            binding: RefCell::new(Binding {
                input: None,
                input_sub: None,
                op_sub: None,
                task: None,
                autorun,
                state: BindingState::Idle,
                shape: Shape::empty(K::DIMS),
                cache_valid: false,
                epoch: 0,
                pending_refresh: false,
                dropped_updates: 0,
            }),
            cache: RefCell::new(ShapedBuffer::new()),
            changed: Notifier::new(),
            _kind: PhantomData,
        });

        let weak = Rc::downgrade(&cell);
        let op_sub = op.changed().subscribe(move |param| {
            if let Some(cell) = weak.upgrade() {
                cell.on_param_changed(*param);
            }
        });
        cell.binding.borrow_mut().op_sub = Some(op_sub);
        debug!(op = op.name(), kind = K::NAME, autorun, "derived.created");

        if input.is_some() {
            cell.attach(input);
        }
        Ok(cell)
    }

    fn check_output(op: &OperationRef, input: &dyn DataCell) -> Result<()> {
        let produced = op.size(input.shape())?.dims();
        if produced != K::DIMS {
            return Err(DataError::OutputDims {
                operation: op.name(),
                expected: K::DIMS,
                produced,
            });
        }
        Ok(())
    }

    /// Replace the input cell. `None` detaches.
    pub fn set_input(&self, input: Option<Data>) -> Result<()> {
        if let Some(input) = &input {
            Self::check_output(&self.op, input.as_ref())?;
        }
        self.attach(input);
        Ok(())
    }

    fn attach(&self, input: Option<Data>) {
        let subscription = input.as_ref().map(|input| {
            let weak = self.this.clone();
            on_changed(input.as_ref(), move || {
                if let Some(cell) = weak.upgrade() {
                    cell.on_input_changed();
                }
            })
        });
        let running = {
            let mut b = self.binding.borrow_mut();
            b.input = input;
            b.input_sub = subscription;
            b.epoch = b.epoch.wrapping_add(1);
            b.state == BindingState::Running
        };
        if running {
            // The in-flight completion sees the new epoch and reruns.
            trace!(op = self.op.name(), "derived.input_replaced_while_running");
            return;
        }
        self.run_cycle();
    }

    #[must_use]
    pub fn input(&self) -> Option<Data> {
        self.binding.borrow().input.clone()
    }

    #[must_use]
    pub fn operation(&self) -> &OperationRef {
        &self.op
    }

    #[must_use]
    pub fn context(&self) -> &MainContext {
        &self.ctx
    }

    #[must_use]
    pub fn autorun(&self) -> bool {
        self.binding.borrow().autorun
    }

    /// Compute eagerly on every input change instead of on the next read.
    pub fn set_autorun(&self, autorun: bool) {
        self.binding.borrow_mut().autorun = autorun;
    }

    #[must_use]
    pub fn state(&self) -> BindingState {
        self.binding.borrow().state
    }

    /// Input changes ignored because a compute was in flight.
    #[must_use]
    pub fn dropped_updates(&self) -> u64 {
        self.binding.borrow().dropped_updates
    }

    /// Prepare and compute now on the calling thread, then notify.
    ///
    /// Returns `false` without doing anything while Running, and `false` if no
    /// value could be produced.
    pub fn recalculate(&self) -> bool {
        if self.state() == BindingState::Running {
            return false;
        }
        let produced = self.compute_sync();
        if produced {
            self.notify_changed();
        }
        produced
    }

    fn on_input_changed(&self) {
        {
            let mut b = self.binding.borrow_mut();
            if b.state == BindingState::Running {
                b.dropped_updates += 1;
                debug!(
                    op = self.op.name(),
                    dropped = b.dropped_updates,
                    "derived.update_dropped"
                );
                return;
            }
        }
        self.run_cycle();
    }

    fn on_param_changed(&self, param: &'static str) {
        {
            let mut b = self.binding.borrow_mut();
            if b.state == BindingState::Running {
                b.pending_refresh = true;
                trace!(op = self.op.name(), param, "derived.param_deferred");
                return;
            }
        }
        trace!(op = self.op.name(), param, "derived.param_changed");
        self.run_cycle();
    }

    fn run_cycle(&self) {
        if self.binding.borrow().input.is_none() {
            self.detach();
        } else if !self.autorun() {
            self.invalidate();
            self.notify_changed();
        } else if !self.op.thread_safe() {
            if self.compute_sync() {
                self.notify_changed();
            }
        } else {
            self.dispatch();
        }
    }

    /// No input: drop the value on every path, release the task and notify.
    fn detach(&self) {
        let task = {
            let mut b = self.binding.borrow_mut();
            b.shape = Shape::empty(K::DIMS);
            b.cache_valid = false;
            b.task.take()
        };
        if let Some(task) = task {
            self.op.release(task);
        }
        trace!(op = self.op.name(), "derived.detached");
        self.notify_changed();
    }

    /// Shape the operation would produce for the current input.
    fn derived_shape(&self, input: Option<&Data>) -> Shape {
        let Some(input) = input else {
            return Shape::empty(K::DIMS);
        };
        match self.op.size(input.shape()) {
            Ok(shape) => shape,
            Err(err) => {
                warn!(op = self.op.name(), error = %err, "derived.size_failed");
                Shape::empty(K::DIMS)
            }
        }
    }

    fn invalidate(&self) {
        let input = self.input();
        let shape = self.derived_shape(input.as_ref());
        let mut b = self.binding.borrow_mut();
        b.shape = shape;
        b.cache_valid = false;
    }

    /// Take the input and task out of the binding and prepare. The binding is
    /// not borrowed while the operation runs.
    fn prepare(&self) -> Option<Box<dyn TaskData>> {
        let (input, existing) = {
            let mut b = self.binding.borrow_mut();
            (b.input.clone(), b.task.take())
        };
        let input = input?;
        match self.op.prepare(existing, input.as_ref()) {
            Ok(Some(task)) => Some(task),
            Ok(None) => {
                let shape = self.derived_shape(Some(&input));
                let mut b = self.binding.borrow_mut();
                b.shape = shape;
                b.cache_valid = false;
                trace!(op = self.op.name(), "derived.degenerate_input");
                None
            }
            Err(err) => {
                warn!(op = self.op.name(), error = %err, "derived.prepare_failed");
                self.binding.borrow_mut().cache_valid = false;
                None
            }
        }
    }

    /// Copy the task's output into the cache and publish its shape.
    fn publish(&self, task: &dyn TaskData) -> bool {
        let Some(out) = task.output() else {
            return false;
        };
        let shape = task.output_shape();
        let written = match self.cache.try_borrow_mut() {
            Ok(mut cache) => {
                cache.copy_from(shape, out);
                true
            }
            Err(_) => {
                debug!(op = self.op.name(), "derived.cache_busy");
                false
            }
        };
        let mut b = self.binding.borrow_mut();
        b.shape = shape;
        b.cache_valid = written;
        written
    }

    fn compute_sync(&self) -> bool {
        let Some(mut task) = self.prepare() else {
            return false;
        };
        let produced = self.op.compute(task.as_mut()).is_some() && self.publish(task.as_ref());
        if !produced {
            self.binding.borrow_mut().cache_valid = false;
        }
        self.binding.borrow_mut().task = Some(task);
        trace!(op = self.op.name(), produced, "derived.computed");
        produced
    }

    fn dispatch(&self) {
        let Some(task) = self.prepare() else {
            return;
        };
        let epoch = {
            let mut b = self.binding.borrow_mut();
            b.state = BindingState::Running;
            b.epoch
        };
        let weak = self.this.clone();
        let id = self.ctx.spawn(task, move |task, outcome| {
            if let Some(cell) = weak.upgrade() {
                cell.complete(task, outcome, epoch);
            }
        });
        trace!(op = self.op.name(), id, "derived.dispatched");
    }

    fn complete(&self, task: Box<dyn TaskData>, outcome: Outcome, epoch: u64) {
        let (superseded, follow_up) = {
            let mut b = self.binding.borrow_mut();
            b.state = BindingState::Idle;
            let superseded = b.epoch != epoch;
            let follow_up = std::mem::take(&mut b.pending_refresh) || superseded;
            (superseded, follow_up)
        };

        let published = match outcome {
            Outcome::Panicked(msg) => {
                warn!(op = self.op.name(), panic = %msg, "derived.compute_panicked");
                false
            }
            Outcome::Empty => {
                self.binding.borrow_mut().task = Some(task);
                false
            }
            Outcome::Produced if superseded => {
                trace!(op = self.op.name(), "derived.superseded_result_discarded");
                self.binding.borrow_mut().task = Some(task);
                false
            }
            Outcome::Produced => {
                let published = self.publish(task.as_ref());
                self.binding.borrow_mut().task = Some(task);
                published
            }
        };
        trace!(op = self.op.name(), published, follow_up, "derived.completed");

        if published {
            self.notify_changed();
        }
        if follow_up {
            self.run_cycle();
        }
    }

    /// Compute now if the cache is stale and nothing is in flight.
    fn refresh(&self) {
        let stale = {
            let b = self.binding.borrow();
            b.state == BindingState::Idle && !b.cache_valid && b.input.is_some()
        };
        if stale {
            self.compute_sync();
        }
    }
}

impl<K: DerivedKind> DataCell for Derived<K> {
    fn shape(&self) -> Shape {
        self.binding.borrow().shape
    }

    fn dims(&self) -> Dims {
        K::DIMS
    }

    fn values(&self) -> Option<Ref<'_, [f64]>> {
        self.refresh();
        if !self.binding.borrow().cache_valid {
            return None;
        }
        Some(Ref::map(self.cache.borrow(), ShapedBuffer::as_slice))
    }

    fn changed(&self) -> &Notifier {
        &self.changed
    }
}

impl<K: DerivedKind> Drop for Derived<K> {
    fn drop(&mut self) {
        if let Some(task) = self.binding.get_mut().task.take() {
            self.op.release(task);
        }
    }
}

/// Bind `op` to `input`, choosing the derived cell type from the
/// operation's output dimensionality.
pub fn new_derived(input: Option<Data>, op: OperationRef) -> Result<Data> {
    new_derived_with_context(input, op, &MainContext::thread_default())
}

/// [`new_derived`] on an explicit context.
pub fn new_derived_with_context(
    input: Option<Data>,
    op: OperationRef,
    ctx: &MainContext,
) -> Result<Data> {
    let input = input.ok_or(DataError::MissingInput {
        operation: op.name(),
    })?;
    let cell: Data = match op.size(input.shape())?.dims() {
        Dims::Scalar => DerivedScalar::with_context(Some(input), op, ctx)?,
        Dims::Vector => DerivedVector::with_context(Some(input), op, ctx)?,
        Dims::Matrix => DerivedMatrix::with_context(Some(input), op, ctx)?,
        Dims::Struct => return Err(DataError::wrong_dims(op.name(), Dims::Struct)),
    };
    Ok(cell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use dflow_core::{ValMatrix, ValVector, scalar_value};
    use dflow_ops::{Elementwise, SliceMode, SliceOperation, SpectralOperation};
    use std::cell::Cell;
    use std::time::Duration;

    fn inline_ctx() -> MainContext {
        MainContext::new(RuntimeConfig::default().inline())
    }

    fn counter(cell: &dyn DataCell) -> (Rc<Cell<u32>>, Subscription) {
        let hits = Rc::new(Cell::new(0));
        let hits_clone = Rc::clone(&hits);
        let sub = on_changed(cell, move || hits_clone.set(hits_clone.get() + 1));
        (hits, sub)
    }

    #[test]
    fn lazy_slice_tracks_input() {
        let ctx = inline_ctx();
        let input = Rc::new(ValVector::from_fn(100, |i| i as f64));
        let op = Rc::new(SliceOperation::new(SliceMode::ELEMENT, 50, 1));
        let cell = DerivedScalar::with_context(Some(input.clone()), op, &ctx).expect("scalar");
        assert!(!cell.autorun());
        assert_eq!(scalar_value(cell.as_ref()), Some(50.0));

        let (hits, _sub) = counter(cell.as_ref());
        input.values_mut()[50] = 137.0;
        input.notify_changed();
        assert_eq!(hits.get(), 1);
        assert_eq!(cell.value(&[]), Ok(137.0));
    }

    #[test]
    fn wrong_output_dims_rejected() {
        let input: Data = Rc::new(ValVector::zeros(8));
        let op: OperationRef = Rc::new(Elementwise::ln());
        let err = DerivedScalar::with_context(Some(input), op, &inline_ctx()).err();
        assert_eq!(
            err,
            Some(DataError::OutputDims {
                operation: "ln",
                expected: Dims::Scalar,
                produced: Dims::Vector,
            })
        );
    }

    #[test]
    fn autorun_thread_unsafe_computes_synchronously() {
        let ctx = MainContext::new(RuntimeConfig::default().inline().with_autorun(true));
        let input = Rc::new(ValVector::new(vec![1.0; 16]));
        let op = Rc::new(SpectralOperation::magnitude());
        let cell = DerivedVector::with_context(Some(input.clone()), op, &ctx).expect("vector");
        let (hits, _sub) = counter(cell.as_ref());

        input.update(|v| v[0] = 2.0);
        assert_eq!(hits.get(), 1);
        assert_eq!(cell.state(), BindingState::Idle);
        assert_eq!(cell.shape(), Shape::Vector(9));
        assert_eq!(ctx.in_flight(), 0);
    }

    #[test]
    fn autorun_thread_safe_waits_for_dispatch() {
        let ctx = MainContext::new(RuntimeConfig::default().inline().with_autorun(true));
        let input = Rc::new(ValVector::from_fn(4, |i| (i + 1) as f64));
        let op = Rc::new(Elementwise::new("double", |x| 2.0 * x));
        let cell = DerivedVector::with_context(Some(input.clone()), op, &ctx).expect("vector");
        assert_eq!(cell.state(), BindingState::Running);
        assert!(cell.values().is_none());

        let (hits, _sub) = counter(cell.as_ref());
        assert_eq!(ctx.dispatch_pending(), 1);
        assert_eq!(hits.get(), 1);
        assert_eq!(cell.state(), BindingState::Idle);
        assert_eq!(cell.values().map(|v| v.to_vec()), Some(vec![2.0, 4.0, 6.0, 8.0]));
    }

    #[test]
    fn update_while_running_is_dropped() {
        let ctx = MainContext::new(RuntimeConfig::default().inline().with_autorun(true));
        let input = Rc::new(ValVector::from_fn(4, |i| i as f64));
        let op = Rc::new(Elementwise::abs());
        let cell = DerivedVector::with_context(Some(input.clone()), op, &ctx).expect("vector");

        input.update(|v| v[0] = -5.0);
        assert_eq!(cell.dropped_updates(), 1);
        assert!(ctx.run_until_idle(Duration::from_secs(5)));
        // The compute snapshot predates the dropped update.
        assert_eq!(cell.value(&[0]), Ok(0.0));
    }

    #[test]
    fn param_change_while_running_reruns() {
        let ctx = MainContext::new(RuntimeConfig::default().inline().with_autorun(true));
        let input = Rc::new(ValMatrix::from_fn(3, 3, |r, c| (3 * r + c) as f64));
        let op = Rc::new(SliceOperation::new(SliceMode::Row, 0, 1));
        let cell =
            DerivedVector::with_context(Some(input), op.clone(), &ctx).expect("vector");
        op.set_index(2);
        assert_eq!(cell.dropped_updates(), 0);
        assert!(ctx.run_until_idle(Duration::from_secs(5)));
        assert_eq!(cell.values().map(|v| v.to_vec()), Some(vec![6.0, 7.0, 8.0]));
    }

    #[test]
    fn replaced_input_supersedes_in_flight_result() {
        let ctx = MainContext::new(RuntimeConfig::default().inline().with_autorun(true));
        let first: Data = Rc::new(ValVector::new(vec![1.0, 1.0]));
        let second: Data = Rc::new(ValVector::new(vec![3.0, 3.0, 3.0]));
        let op = Rc::new(Elementwise::abs());
        let cell = DerivedVector::with_context(Some(first), op, &ctx).expect("vector");
        cell.set_input(Some(second)).expect("vector input");
        assert!(ctx.run_until_idle(Duration::from_secs(5)));
        assert_eq!(cell.shape(), Shape::Vector(3));
        assert_eq!(cell.value(&[2]), Ok(3.0));
    }

    #[test]
    fn degenerate_input_has_no_value() {
        let ctx = inline_ctx();
        let input = Rc::new(ValVector::zeros(0));
        let op = Rc::new(Elementwise::ln());
        let cell = DerivedVector::with_context(Some(input), op, &ctx).expect("vector");
        assert!(cell.values().is_none());
        assert_eq!(cell.value(&[0]), Err(DataError::NoValue));
    }

    #[test]
    fn recalculate_forces_compute() {
        let ctx = inline_ctx();
        let input = Rc::new(ValVector::from_fn(3, |i| i as f64));
        let op = Rc::new(Elementwise::new("neg", |x| -x));
        let cell = DerivedVector::with_context(Some(input), op, &ctx).expect("vector");
        let (hits, _sub) = counter(cell.as_ref());
        assert!(cell.recalculate());
        assert_eq!(hits.get(), 1);
        assert_eq!(cell.value(&[2]), Ok(-2.0));
    }

    #[test]
    fn new_derived_picks_kind() {
        let input: Data = Rc::new(ValMatrix::zeros(4, 6));
        let ctx = inline_ctx();
        let row = new_derived_with_context(
            Some(input.clone()),
            Rc::new(SliceOperation::new(SliceMode::Row, 0, 1)),
            &ctx,
        )
        .expect("slice of matrix");
        assert_eq!(row.dims(), Dims::Vector);
        assert_eq!(row.shape(), Shape::Vector(6));

        let missing = new_derived_with_context(None, Rc::new(Elementwise::ln()), &ctx).err();
        assert_eq!(missing, Some(DataError::MissingInput { operation: "ln" }));
    }

    #[test]
    fn detaching_autorun_cell_clears_value_on_pool_path() {
        let ctx = MainContext::new(RuntimeConfig::default().inline().with_autorun(true));
        let input: Data = Rc::new(ValVector::from_fn(3, |i| i as f64));
        let cell = DerivedVector::with_context(Some(input), Rc::new(Elementwise::abs()), &ctx)
            .expect("vector");
        assert!(ctx.run_until_idle(Duration::from_secs(5)));
        assert_eq!(cell.values().map(|v| v.to_vec()), Some(vec![0.0, 1.0, 2.0]));

        let (hits, _sub) = counter(cell.as_ref());
        cell.set_input(None).expect("detach");
        assert!(ctx.run_until_idle(Duration::from_secs(5)));
        assert_eq!(hits.get(), 1);
        assert!(cell.values().is_none());
        assert_eq!(cell.shape(), Shape::Vector(0));
        assert_eq!(cell.value(&[0]), Err(DataError::NoValue));
    }

    #[test]
    fn detaching_autorun_cell_clears_value_on_sync_path() {
        let ctx = MainContext::new(RuntimeConfig::default().inline().with_autorun(true));
        let input: Data = Rc::new(ValVector::new(vec![1.0; 8]));
        let cell = DerivedVector::with_context(
            Some(input),
            Rc::new(SpectralOperation::magnitude()),
            &ctx,
        )
        .expect("vector");
        assert_eq!(cell.shape(), Shape::Vector(5));
        assert_eq!(cell.value(&[0]), Ok(8.0));

        let (hits, _sub) = counter(cell.as_ref());
        cell.set_input(None).expect("detach");
        assert_eq!(hits.get(), 1);
        assert!(cell.values().is_none());
        assert_eq!(cell.shape(), Shape::Vector(0));
    }

    #[test]
    fn detaching_input_clears_value() {
        let ctx = inline_ctx();
        let input: Data = Rc::new(ValVector::from_fn(3, |i| i as f64));
        let cell = DerivedVector::with_context(Some(input), Rc::new(Elementwise::abs()), &ctx)
            .expect("vector");
        assert!(cell.values().is_some());
        cell.set_input(None).expect("detach");
        assert!(cell.values().is_none());
        assert_eq!(cell.shape(), Shape::Vector(0));
    }
}
