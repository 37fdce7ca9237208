//! Scalar cells that mirror a numeric property of an external object.

use std::cell::{Ref, RefCell};
use std::rc::{Rc, Weak};

use dflow_core::{
    DataCell, DataError, Notifier, PropertySource, Result, Shape, Subscription,
};
use tracing::debug;

/// A scalar cell reading property `name` of `source`.
///
/// The property's change notification is republished as this cell's
/// `notify_changed`. Reads always fetch the current property value.
pub struct PropertyScalar {
    source: Rc<dyn PropertySource>,
    name: String,
    cache: RefCell<[f64; 1]>,
    changed: Notifier,
    _source_sub: Subscription,
}

impl std::fmt::Debug for PropertyScalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyScalar")
            .field("name", &self.name)
            .field("cache", &self.cache.borrow()[0])
            .finish_non_exhaustive()
    }
}

impl PropertyScalar {
    /// Observe property `name` of `source`.
    ///
    /// Fails with [`DataError::UnknownProperty`] when `source` has no such
    /// property and [`DataError::UnsupportedProperty`] when it is not numeric.
    pub fn new(source: Rc<dyn PropertySource>, name: &str) -> Result<Rc<Self>> {
        let kind = source
            .property_kind(name)
            .ok_or_else(|| DataError::unknown_property(name))?;
        if !kind.is_numeric() {
            return Err(DataError::UnsupportedProperty {
                name: name.to_owned(),
                kind: kind.name(),
            });
        }
        debug!(name, %kind, "observing property");

        Ok(Rc::new_cyclic(|this: &Weak<Self>| {
            let weak = this.clone();
            let source_sub = source.subscribe_property(
                name,
                Box::new(move || {
                    if let Some(cell) = weak.upgrade() {
                        cell.notify_changed();
                    }
                }),
            );
            Self {
                source: Rc::clone(&source),
                name: name.to_owned(),
                cache: RefCell::new([0.0]),
                changed: Notifier::new(),
                _source_sub: source_sub,
            }
        }))
    }

    /// Name of the observed property.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current property value widened to `f64`.
    #[must_use]
    pub fn get(&self) -> Option<f64> {
        self.source.property(&self.name).and_then(|v| v.as_f64())
    }
}

impl DataCell for PropertyScalar {
    fn shape(&self) -> Shape {
        Shape::Scalar
    }

    fn values(&self) -> Option<Ref<'_, [f64]>> {
        let current = self.get()?;
        // An outstanding borrow already holds the current value.
        if let Ok(mut cache) = self.cache.try_borrow_mut() {
            cache[0] = current;
        }
        Some(Ref::map(self.cache.borrow(), |c| &c[..]))
    }

    fn changed(&self) -> &Notifier {
        &self.changed
    }
}
