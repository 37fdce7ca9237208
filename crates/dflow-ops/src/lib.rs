#![forbid(unsafe_code)]

//! Operations: elementwise maps, slices, subsets, spectra, and scalar
//! observers over external properties.

pub mod elementwise;
pub mod property;
pub mod slice;
pub mod spectral;
pub mod subset;

pub use elementwise::Elementwise;
pub use property::PropertyScalar;
pub use slice::{SliceMode, SliceOperation};
pub use spectral::{SpectralMode, SpectralOperation};
pub use subset::SubsetOperation;

use dflow_core::{Notifier, Subscription};

/// Forward changes of parameter `name` on an operation's channel to
/// `listener`.
pub(crate) fn subscribe_param(
    changed: &Notifier<&'static str>,
    name: &str,
    listener: Box<dyn Fn()>,
) -> Subscription {
    let name = name.to_owned();
    changed.subscribe(move |param| {
        if *param == name {
            listener();
        }
    })
}
