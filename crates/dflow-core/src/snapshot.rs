//! Owned copies of cell contents for writers and exporters.

use std::collections::BTreeMap;

use crate::cell::DataCell;
use crate::shape::Shape;

/// Point-in-time copy of a data cell.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum CellSnapshot {
    Scalar {
        value: f64,
    },
    Vector {
        values: Vec<f64>,
    },
    Matrix {
        rows: usize,
        cols: usize,
        values: Vec<f64>,
    },
    Struct {
        members: BTreeMap<String, CellSnapshot>,
    },
}

impl CellSnapshot {
    #[must_use]
    pub fn shape(&self) -> Shape {
        match self {
            Self::Scalar { .. } => Shape::Scalar,
            Self::Vector { values } => Shape::Vector(values.len()),
            Self::Matrix { rows, cols, .. } => Shape::matrix(*rows, *cols),
            Self::Struct { .. } => Shape::Struct,
        }
    }
}

/// Copy the current contents of `cell`.
///
/// Returns `None` when a numeric cell has no value available. Struct members
/// without a value are left out of the struct snapshot.
#[must_use]
pub fn snapshot(cell: &dyn DataCell) -> Option<CellSnapshot> {
    if let Some(st) = cell.as_struct() {
        let mut members = BTreeMap::new();
        st.for_each(|name, member| {
            if let Some(snap) = snapshot(member.as_ref()) {
                members.insert(name.to_owned(), snap);
            }
        });
        return Some(CellSnapshot::Struct { members });
    }

    let values = cell.values()?;
    // Shape read after values(): derived cells refresh it lazily.
    match cell.shape() {
        Shape::Scalar => values.first().map(|&value| CellSnapshot::Scalar { value }),
        Shape::Vector(_) => Some(CellSnapshot::Vector {
            values: values.to_vec(),
        }),
        Shape::Matrix { rows, cols } => Some(CellSnapshot::Matrix {
            rows,
            cols,
            values: values.to_vec(),
        }),
        Shape::Struct => None,
    }
}
