#![forbid(unsafe_code)]

//! dflow public facade crate.
//!
//! Reactive numeric data cells, operations over them, and derived cells that
//! recompute when their input changes.
//!
//! ```
//! use std::rc::Rc;
//! use dflow::prelude::*;
//!
//! let ctx = MainContext::new(RuntimeConfig::default().inline());
//! let trace = Rc::new(ValVector::from_fn(100, |i| i as f64));
//! let probe = DerivedScalar::with_context(
//!     Some(trace.clone()),
//!     Rc::new(SliceOperation::new(SliceMode::ELEMENT, 50, 1)),
//!     &ctx,
//! )
//! .unwrap();
//! assert_eq!(probe.value(&[]), Ok(50.0));
//! ```

pub use dflow_core as core;
pub use dflow_ops as ops;
pub use dflow_runtime as runtime;

pub use dflow_core::{Data, DataCell, DataError, Result, Shape, snapshot};
pub use dflow_runtime::{new_derived, new_derived_with_context};

pub mod prelude {
    pub use dflow_core::{
        CellSnapshot, Data, DataCell, DataError, Dims, Operation, OperationRef, PropertyBag,
        PropertySource, PropertyValue, Shape, StructData, Subscription, ValMatrix, ValScalar,
        ValVector, on_changed, scalar_value, snapshot,
    };
    pub use dflow_ops::{
        Elementwise, PropertyScalar, SliceMode, SliceOperation, SpectralMode, SpectralOperation,
        SubsetOperation,
    };
    pub use dflow_runtime::{
        BindingState, DerivedMatrix, DerivedScalar, DerivedVector, MainContext, RuntimeConfig,
        new_derived, new_derived_with_context,
    };
}
