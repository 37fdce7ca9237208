#![no_main]

use std::rc::Rc;

use arbitrary::Arbitrary;
use dflow_core::{Data, DataCell, ValMatrix, ValVector};
use dflow_ops::{Elementwise, SliceMode, SliceOperation, SpectralOperation, SubsetOperation};
use dflow_runtime::{MainContext, RuntimeConfig, new_derived_with_context};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum FuzzInput {
    Vector(u8),
    Matrix { rows: u8, cols: u8 },
}

#[derive(Arbitrary, Debug)]
enum FuzzOp {
    Abs,
    Slice { mode: u8, index: u16, width: i16 },
    Subset { start1: u8, length1: u8, start2: u8, length2: u8 },
    Magnitude,
    Phase,
}

impl FuzzInput {
    fn cell(&self) -> Data {
        match *self {
            FuzzInput::Vector(len) => {
                Rc::new(ValVector::from_fn(usize::from(len) + 1, |i| i as f64 - 7.5))
            }
            FuzzInput::Matrix { rows, cols } => Rc::new(ValMatrix::from_fn(
                usize::from(rows % 32) + 1,
                usize::from(cols % 32) + 1,
                |r, c| (r * 3) as f64 - c as f64,
            )),
        }
    }
}

impl FuzzOp {
    fn build(&self) -> dflow_core::OperationRef {
        match *self {
            FuzzOp::Abs => Rc::new(Elementwise::abs()),
            FuzzOp::Slice { mode, index, width } => {
                let mode = match mode % 4 {
                    0 => SliceMode::Row,
                    1 => SliceMode::Col,
                    2 => SliceMode::SumRows,
                    _ => SliceMode::SumCols,
                };
                let width = i32::from(width).max(-1);
                Rc::new(SliceOperation::new(mode, usize::from(index), width).with_average(index % 2 == 0))
            }
            FuzzOp::Subset { start1, length1, start2, length2 } => Rc::new(SubsetOperation::new(
                usize::from(start1),
                usize::from(length1),
                usize::from(start2),
                usize::from(length2),
            )),
            FuzzOp::Magnitude => Rc::new(SpectralOperation::magnitude()),
            FuzzOp::Phase => Rc::new(SpectralOperation::phase()),
        }
    }
}

fuzz_target!(|case: (FuzzInput, FuzzOp)| {
    let (input, op) = case;
    let ctx = MainContext::new(RuntimeConfig::default().inline());
    let Ok(cell) = new_derived_with_context(Some(input.cell()), op.build(), &ctx) else {
        return;
    };
    let shape = cell.shape();
    if let Some(values) = cell.values() {
        assert_eq!(values.len(), shape.len());
    }
});
