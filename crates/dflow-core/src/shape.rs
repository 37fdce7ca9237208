//! Dimensionality tags and concrete shapes.
//!
//! Matrices are stored row-major: element `(row, col)` lives at
//! `row * cols + col`.

use std::fmt;

/// Dimensionality tag of a data cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Dims {
    /// Named mapping of sub-cells (tag -1). Not numeric.
    Struct,
    Scalar,
    Vector,
    Matrix,
}

impl Dims {
    /// Numeric tag: -1 for struct, otherwise the number of axes.
    #[must_use]
    pub const fn rank(self) -> i8 {
        match self {
            Self::Struct => -1,
            Self::Scalar => 0,
            Self::Vector => 1,
            Self::Matrix => 2,
        }
    }

    #[must_use]
    pub const fn is_numeric(self) -> bool {
        !matches!(self, Self::Struct)
    }
}

impl fmt::Display for Dims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Struct => "struct",
            Self::Scalar => "scalar",
            Self::Vector => "vector",
            Self::Matrix => "matrix",
        })
    }
}

/// Current extent of a data cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Shape {
    Struct,
    Scalar,
    Vector(usize),
    Matrix { rows: usize, cols: usize },
}

impl Shape {
    #[must_use]
    pub const fn matrix(rows: usize, cols: usize) -> Self {
        Self::Matrix { rows, cols }
    }

    #[must_use]
    pub const fn dims(self) -> Dims {
        match self {
            Self::Struct => Dims::Struct,
            Self::Scalar => Dims::Scalar,
            Self::Vector(_) => Dims::Vector,
            Self::Matrix { .. } => Dims::Matrix,
        }
    }

    /// The empty shape for a dimensionality: what a cell reports before it
    /// has any input.
    #[must_use]
    pub const fn empty(dims: Dims) -> Self {
        match dims {
            Dims::Struct => Self::Struct,
            Dims::Scalar => Self::Scalar,
            Dims::Vector => Self::Vector(0),
            Dims::Matrix => Self::Matrix { rows: 0, cols: 0 },
        }
    }

    /// Number of `f64` elements backing this shape.
    #[must_use]
    pub const fn len(self) -> usize {
        match self {
            Self::Struct => 0,
            Self::Scalar => 1,
            Self::Vector(len) => len,
            Self::Matrix { rows, cols } => rows * cols,
        }
    }

    /// True when a numeric shape holds no elements (degenerate input).
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Extent along each axis; empty for scalars and structs.
    #[must_use]
    pub fn extents(self) -> Vec<usize> {
        match self {
            Self::Struct | Self::Scalar => Vec::new(),
            Self::Vector(len) => vec![len],
            Self::Matrix { rows, cols } => vec![rows, cols],
        }
    }

    /// Flat offset of `index` in the backing buffer.
    ///
    /// Returns `None` when the arity does not match or any component is past
    /// the extent.
    #[must_use]
    pub fn offset(self, index: &[usize]) -> Option<usize> {
        match (self, index) {
            (Self::Scalar, []) => Some(0),
            (Self::Vector(len), [i]) if *i < len => Some(*i),
            (Self::Matrix { rows, cols }, [r, c]) if *r < rows && *c < cols => Some(r * cols + c),
            _ => None,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Struct => f.write_str("struct"),
            Self::Scalar => f.write_str("scalar"),
            Self::Vector(len) => write!(f, "[{len}]"),
            Self::Matrix { rows, cols } => write!(f, "{rows}x{cols}"),
        }
    }
}
