use thiserror::Error;

use crate::shape::{Dims, Shape};

pub type Result<T> = std::result::Result<T, DataError>;

/// Errors surfaced by data cells and operations.
///
/// Variants other than [`DataError::OutOfRange`] and [`DataError::NoValue`]
/// are contract violations: they point at a caller bug (wrong dimensionality
/// wired into an operation, a missing input, an unknown attribute) rather than
/// at a data-dependent condition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("index {index:?} out of range for shape {shape}")]
    OutOfRange { index: Vec<usize>, shape: Shape },

    #[error("expected {expected} indices for shape {shape}, got {got}")]
    IndexArity {
        expected: usize,
        got: usize,
        shape: Shape,
    },

    #[error("no value available")]
    NoValue,

    #[error("{operation} does not accept {found} input")]
    WrongDims {
        operation: &'static str,
        found: Dims,
    },

    #[error("{operation} mode {mode} does not accept {found} input")]
    UnsupportedMode {
        operation: &'static str,
        mode: &'static str,
        found: Dims,
    },

    #[error("{operation} produces {produced} output, cell holds {expected}")]
    OutputDims {
        operation: &'static str,
        expected: Dims,
        produced: Dims,
    },

    #[error("{operation} requires an input")]
    MissingInput { operation: &'static str },

    #[error("unknown property: {name}")]
    UnknownProperty { name: String },

    #[error("property {name} is not numeric ({kind})")]
    UnsupportedProperty { name: String, kind: &'static str },
}

impl DataError {
    #[must_use]
    pub fn wrong_dims(operation: &'static str, found: Dims) -> Self {
        Self::WrongDims { operation, found }
    }

    #[must_use]
    pub fn unknown_property(name: impl Into<String>) -> Self {
        Self::UnknownProperty { name: name.into() }
    }

    /// Whether this error indicates a caller bug rather than a data condition.
    #[must_use]
    pub fn is_contract_violation(&self) -> bool {
        !matches!(self, Self::OutOfRange { .. } | Self::NoValue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_out_of_range() {
        let err = DataError::OutOfRange {
            index: vec![3, 9],
            shape: Shape::Matrix { rows: 4, cols: 5 },
        };
        assert_eq!(err.to_string(), "index [3, 9] out of range for shape 4x5");
    }

    #[test]
    fn contract_violation_classification() {
        assert!(DataError::wrong_dims("slice", Dims::Scalar).is_contract_violation());
        assert!(DataError::unknown_property("gain").is_contract_violation());
        assert!(!DataError::NoValue.is_contract_violation());
    }
}
