#![no_main]

use std::rc::Rc;
use std::time::Duration;

use arbitrary::Arbitrary;
use dflow_core::{DataCell, ValVector};
use dflow_ops::{SliceMode, SliceOperation};
use dflow_runtime::{DerivedVector, MainContext, RuntimeConfig};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Step {
    Set { index: u8, value: i16 },
    Resize(u8),
    Notify,
    Index(u8),
    Width(i8),
    Autorun(bool),
    Dispatch,
    Read,
}

fuzz_target!(|steps: Vec<Step>| {
    let ctx = MainContext::new(RuntimeConfig::default().inline());
    let input = Rc::new(ValVector::from_fn(16, |i| i as f64));
    let op = Rc::new(SliceOperation::new(SliceMode::SumRows, 0, 3));
    let Ok(cell) = DerivedVector::with_context(Some(input.clone()), op.clone(), &ctx) else {
        return;
    };

    for step in steps.iter().take(256) {
        match *step {
            Step::Set { index, value } => {
                let len = input.len();
                input.update(|d| d[usize::from(index) % len] = f64::from(value));
            }
            Step::Resize(len) => input.resize(usize::from(len) + 1),
            Step::Notify => input.notify_changed(),
            Step::Index(index) => op.set_index(usize::from(index)),
            Step::Width(width) => op.set_width(i32::from(width).max(-1)),
            Step::Autorun(on) => cell.set_autorun(on),
            Step::Dispatch => {
                ctx.run_until_idle(Duration::from_millis(100));
            }
            Step::Read => {
                if let Some(values) = cell.values() {
                    assert_eq!(values.len(), cell.shape().len());
                }
            }
        }
    }
});
