#![forbid(unsafe_code)]

//! Core: observable data cells, shapes, change notification, and the
//! operation contract.

pub mod buffer;
pub mod cell;
pub mod error;
pub mod notify;
pub mod operation;
pub mod property;
pub mod shape;
pub mod snapshot;
pub mod structure;
pub mod value;

pub use buffer::ShapedBuffer;
pub use cell::{Data, DataCell, on_changed, scalar_value};
pub use error::{DataError, Result};
pub use notify::{Notifier, Subscription};
pub use operation::{Operation, OperationRef, TaskData, downcast_task};
pub use property::{PropertyBag, PropertyKind, PropertySource, PropertyValue};
pub use shape::{Dims, Shape};
pub use snapshot::{CellSnapshot, snapshot};
pub use structure::StructData;
pub use value::{ValMatrix, ValScalar, ValVector};
