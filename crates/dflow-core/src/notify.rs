#![forbid(unsafe_code)]

//! Change-notification channel shared by data cells and operations.
//!
//! # Design
//!
//! [`Notifier<E>`] is an ordered observer list. Listeners are stored as
//! `Weak` callbacks; the strong `Rc` lives in the [`Subscription`] guard
//! handed back to the subscriber. Dropping the guard unsubscribes.
//!
//! Delivery is synchronous and happens on the thread that calls
//! [`Notifier::notify`]. Notifiers are `!Send`: every cell and every
//! subscriber lives on the thread that owns its main context.
//!
//! # Failure Modes
//!
//! - **Re-entrant notify**: a listener may call `notify` on the same notifier
//!   (callbacks are collected before any is invoked, so no borrow is held).
//!   Unbounded recursion is the caller's problem.
//! - **Subscriber leak**: a `Subscription` kept forever keeps its callback
//!   alive. Dead entries are pruned lazily during `notify()`.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type CallbackRc<E> = Rc<dyn Fn(&E)>;
type CallbackWeak<E> = Weak<dyn Fn(&E)>;

/// Ordered list of change listeners carrying an event payload `E`.
///
/// Data cells use `Notifier<()>`; operations announce parameter changes with
/// `Notifier<&'static str>` carrying the parameter name.
pub struct Notifier<E = ()> {
    subscribers: RefCell<Vec<CallbackWeak<E>>>,
}

impl<E> Default for Notifier<E> {
    fn default() -> Self {
        Self {
            subscribers: RefCell::new(Vec::new()),
        }
    }
}

impl<E> fmt::Debug for Notifier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("subscriber_count", &self.subscribers.borrow().len())
            .finish()
    }
}

impl<E: 'static> Notifier<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. The listener stays registered for as long as the
    /// returned [`Subscription`] is alive.
    pub fn subscribe(&self, callback: impl Fn(&E) + 'static) -> Subscription {
        let strong: CallbackRc<E> = Rc::new(callback);
        self.subscribers.borrow_mut().push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Invoke every live listener in registration order.
    pub fn notify(&self, event: &E) {
        let callbacks: Vec<CallbackRc<E>> = {
            let mut subscribers = self.subscribers.borrow_mut();
            subscribers.retain(|w| w.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };
        for cb in &callbacks {
            cb(event);
        }
    }

    /// Registered listeners, including dropped ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    /// Listeners whose subscription guard is still alive.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.subscribers
            .borrow()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }
}

/// RAII guard for a listener registered on a [`Notifier`].
///
/// Dropping the guard drops the strong callback, so the notifier's `Weak`
/// entry fails to upgrade from then on.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    _guard: Box<dyn Any>,
}

impl Subscription {
    /// Explicitly unsubscribe. Equivalent to dropping the guard.
    pub fn unsubscribe(self) {}
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
