#![forbid(unsafe_code)]

//! Runtime: derived cells, the main context, and the worker pool.

pub mod config;
pub mod context;
pub mod derived;
#[cfg(feature = "tracing-json")]
pub mod logging;
pub mod pool;

pub use config::RuntimeConfig;
pub use context::MainContext;
pub use derived::{
    BindingState, Derived, DerivedKind, DerivedMatrix, DerivedScalar, DerivedVector, MatrixKind,
    ScalarKind, VectorKind, new_derived, new_derived_with_context,
};
pub use pool::{Outcome, WorkerPool};
