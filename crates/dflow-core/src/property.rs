//! Named attributes of external objects.
//!
//! [`PropertySource`] is the seam through which arbitrary objects (camera
//! settings, operation parameters) expose typed attributes and per-attribute
//! change notification. [`PropertyBag`] is a ready-made source for producers
//! that just need a mutable set of named values.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{DataError, Result};
use crate::notify::{Notifier, Subscription};

/// Type of a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    F64,
    F32,
    I32,
    U32,
    I64,
    U64,
    Bool,
    Text,
}

impl PropertyKind {
    /// Whether values of this kind widen losslessly enough to `f64` to be
    /// observed as a scalar.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        !matches!(self, Self::Bool | Self::Text)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::F64 => "f64",
            Self::F32 => "f32",
            Self::I32 => "i32",
            Self::U32 => "u32",
            Self::I64 => "i64",
            Self::U64 => "u64",
            Self::Bool => "bool",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    F64(f64),
    F32(f32),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    Bool(bool),
    Text(String),
}

impl PropertyValue {
    #[must_use]
    pub const fn kind(&self) -> PropertyKind {
        match self {
            Self::F64(_) => PropertyKind::F64,
            Self::F32(_) => PropertyKind::F32,
            Self::I32(_) => PropertyKind::I32,
            Self::U32(_) => PropertyKind::U32,
            Self::I64(_) => PropertyKind::I64,
            Self::U64(_) => PropertyKind::U64,
            Self::Bool(_) => PropertyKind::Bool,
            Self::Text(_) => PropertyKind::Text,
        }
    }

    /// Widen a numeric value to `f64`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::F64(v) => Some(v),
            Self::F32(v) => Some(f64::from(v)),
            Self::I32(v) => Some(f64::from(v)),
            Self::U32(v) => Some(f64::from(v)),
            Self::I64(v) => Some(v as f64),
            Self::U64(v) => Some(v as f64),
            Self::Bool(_) | Self::Text(_) => None,
        }
    }
}

/// An object exposing named, typed attributes with change notification.
pub trait PropertySource {
    /// Kind of property `name`, or `None` if there is no such property.
    fn property_kind(&self, name: &str) -> Option<PropertyKind>;

    /// Current value of property `name`.
    fn property(&self, name: &str) -> Option<PropertyValue>;

    /// Invoke `listener` whenever property `name` changes.
    fn subscribe_property(&self, name: &str, listener: Box<dyn Fn()>) -> Subscription;
}

/// A mutable set of named values implementing [`PropertySource`].
#[derive(Debug, Default)]
pub struct PropertyBag {
    values: RefCell<BTreeMap<String, PropertyValue>>,
    changed: Notifier<String>,
}

impl PropertyBag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or redefine) property `name`. Notifies listeners of `name`.
    pub fn define(&self, name: impl Into<String>, value: PropertyValue) {
        let name = name.into();
        self.values.borrow_mut().insert(name.clone(), value);
        self.changed.notify(&name);
    }

    /// Update an existing property. Notifies only if the value changed.
    pub fn set(&self, name: &str, value: PropertyValue) -> Result<()> {
        {
            let mut values = self.values.borrow_mut();
            let slot = values
                .get_mut(name)
                .ok_or_else(|| DataError::unknown_property(name))?;
            if *slot == value {
                return Ok(());
            }
            *slot = value;
        }
        self.changed.notify(&name.to_owned());
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<PropertyValue> {
        self.values.borrow().get(name).cloned()
    }
}

impl PropertySource for PropertyBag {
    fn property_kind(&self, name: &str) -> Option<PropertyKind> {
        self.values.borrow().get(name).map(PropertyValue::kind)
    }

    fn property(&self, name: &str) -> Option<PropertyValue> {
        self.get(name)
    }

    fn subscribe_property(&self, name: &str, listener: Box<dyn Fn()>) -> Subscription {
        let name = name.to_owned();
        self.changed.subscribe(move |changed| {
            if *changed == name {
                listener();
            }
        })
    }
}
