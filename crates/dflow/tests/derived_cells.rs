//! End-to-end behaviour of derived cells over every operation.
//!
//! Each test builds a producer, binds an operation, reads the result, mutates
//! the producer and reads again.

use std::rc::Rc;
use std::time::Duration;

use dflow::prelude::*;

fn ctx() -> MainContext {
    MainContext::new(RuntimeConfig::default().inline())
}

fn ramp(len: usize) -> Rc<ValVector> {
    Rc::new(ValVector::from_fn(len, |i| i as f64))
}

// ── Scalar outputs ────────────────────────────────────────────────────────

#[test]
fn property_scalar_follows_slice_index() {
    let op = Rc::new(SliceOperation::new(SliceMode::Row, 50, 1));
    let index = PropertyScalar::new(op.clone(), "index").expect("numeric property");
    assert_eq!(index.value(&[]), Ok(50.0));
    op.set_index(30);
    assert_eq!(index.value(&[]), Ok(30.0));
}

#[test]
fn scalar_ln_of_scalar() {
    let input = Rc::new(ValScalar::new(10.0));
    let s = DerivedScalar::with_context(Some(input.clone()), Rc::new(Elementwise::ln()), &ctx())
        .expect("scalar");
    assert_eq!(s.value(&[]), Ok(10f64.ln()));
    input.set(137.0);
    assert_eq!(s.value(&[]), Ok(137f64.ln()));
}

#[test]
fn scalar_element_of_vector() {
    let input = ramp(100);
    let s = DerivedScalar::with_context(
        Some(input.clone()),
        Rc::new(SliceOperation::new(SliceMode::ELEMENT, 50, 1)),
        &ctx(),
    )
    .expect("scalar");
    assert_eq!(s.value(&[]), Ok(50.0));
    input.values_mut()[50] = 137.0;
    input.notify_changed();
    assert_eq!(s.value(&[]), Ok(137.0));
}

// ── Vector outputs ────────────────────────────────────────────────────────

#[test]
fn vector_ln() {
    let input = Rc::new(ValVector::from_fn(100, |i| (i + 1) as f64));
    let v = DerivedVector::with_context(Some(input.clone()), Rc::new(Elementwise::ln()), &ctx())
        .expect("vector");
    assert_eq!(v.shape(), Shape::Vector(100));
    assert_eq!(v.value(&[49]), Ok(50f64.ln()));
    input.update(|d| d[49] = 137.0);
    assert_eq!(v.value(&[49]), Ok(137f64.ln()));
}

#[test]
fn vector_subset() {
    let v = DerivedVector::with_context(
        Some(ramp(100)),
        Rc::new(SubsetOperation::range(5, 20)),
        &ctx(),
    )
    .expect("vector");
    assert_eq!(v.shape(), Shape::Vector(20));
    assert_eq!(v.value(&[0]), Ok(5.0));
}

#[test]
fn vector_fft_magnitude_and_phase() {
    let input = Rc::new(ValVector::new(vec![1.0; 100]));
    let mag = DerivedVector::with_context(
        Some(input.clone()),
        Rc::new(SpectralOperation::magnitude()),
        &ctx(),
    )
    .expect("vector");
    assert_eq!(mag.shape(), Shape::Vector(51));
    let bin2 = mag.value(&[2]).expect("bin 2");
    assert!(bin2.abs() < 1e-9, "bin 2 magnitude {bin2}");

    let phase = DerivedVector::with_context(
        Some(input),
        Rc::new(SpectralOperation::phase()),
        &ctx(),
    )
    .expect("vector");
    let dc_phase = phase.value(&[0]).expect("bin 0");
    assert!(dc_phase.abs() < 1e-12, "bin 0 phase {dc_phase}");
}

#[test]
fn vector_row_of_matrix() {
    let m = Rc::new(ValMatrix::from_fn(100, 100, |r, c| (100 * r + c) as f64));
    let v = DerivedVector::with_context(
        Some(m.clone()),
        Rc::new(SliceOperation::new(SliceMode::Row, 50, 1)),
        &ctx(),
    )
    .expect("vector");
    assert_eq!(v.shape(), Shape::Vector(100));
    assert_eq!(v.value(&[50]), Ok(5050.0));
    m.values_mut()[50 * 100 + 50] = 137.0;
    m.notify_changed();
    assert_eq!(v.value(&[50]), Ok(137.0));
}

#[test]
fn vector_row_attached_later() {
    let m = Rc::new(ValMatrix::from_fn(100, 100, |r, c| (100 * r + c) as f64));
    let v = DerivedVector::with_context(
        None,
        Rc::new(SliceOperation::new(SliceMode::Row, 50, 1)),
        &ctx(),
    )
    .expect("vector");
    assert!(v.values().is_none());
    v.set_input(Some(m.clone())).expect("matrix input");
    assert_eq!(v.shape(), Shape::Vector(100));
    assert_eq!(v.value(&[50]), Ok(5050.0));
    m.values_mut()[50 * 100 + 50] = 137.0;
    m.notify_changed();
    assert_eq!(v.value(&[50]), Ok(137.0));
}

#[test]
fn vector_rejects_wrong_input() {
    let v = DerivedVector::with_context(None, Rc::new(SpectralOperation::magnitude()), &ctx())
        .expect("vector");
    let err = v
        .set_input(Some(Rc::new(ValMatrix::zeros(4, 4))))
        .expect_err("matrix is not a valid spectral input");
    assert!(err.is_contract_violation());
}

// ── Matrix outputs ────────────────────────────────────────────────────────

#[test]
fn matrix_ln() {
    // m[row][col] = row + col + 2
    let input = Rc::new(ValMatrix::from_fn(100, 100, |r, c| (r + c + 2) as f64));
    let m = DerivedMatrix::with_context(Some(input.clone()), Rc::new(Elementwise::ln()), &ctx())
        .expect("matrix");
    assert_eq!(m.shape(), Shape::matrix(100, 100));
    assert_eq!(m.value(&[0, 0]), Ok(2f64.ln()));
    assert_eq!(m.value(&[0, 1]), Ok(3f64.ln()));
    assert_eq!(m.value(&[1, 0]), Ok(3f64.ln()));
    input.update(|d| d[0] = 137.0);
    assert_eq!(m.value(&[0, 0]), Ok(137f64.ln()));
}

#[test]
fn matrix_subset() {
    let input = Rc::new(ValMatrix::from_fn(100, 100, |r, c| (r + c) as f64));
    let m = DerivedMatrix::with_context(
        Some(input),
        Rc::new(SubsetOperation::new(5, 20, 5, 25)),
        &ctx(),
    )
    .expect("matrix");
    assert_eq!(m.shape(), Shape::matrix(25, 20));
    assert_eq!(m.value(&[0, 0]), Ok(10.0));
    assert!(matches!(
        m.value(&[25, 0]),
        Err(DataError::OutOfRange { .. })
    ));
}

// ── Shape changes and chains ──────────────────────────────────────────────

#[test]
fn shape_change_reallocates_and_republishes() {
    let input = ramp(10);
    let v = DerivedVector::with_context(Some(input.clone()), Rc::new(Elementwise::abs()), &ctx())
        .expect("vector");
    assert_eq!(v.shape(), Shape::Vector(10));
    input.resize(25);
    assert_eq!(v.shape(), Shape::Vector(25));
    assert_eq!(v.values().map(|d| d.len()), Some(25));
}

#[test]
fn chained_derivations() {
    let c = ctx();
    let m = Rc::new(ValMatrix::from_fn(8, 16, |r, _| r as f64 + 1.0));
    let rows: Data = DerivedVector::with_context(
        Some(m.clone()),
        Rc::new(SliceOperation::new(SliceMode::SumRows, 0, -1).with_average(true)),
        &c,
    )
    .expect("row mean");
    let spectrum = DerivedVector::with_context(
        Some(rows),
        Rc::new(SpectralOperation::magnitude()),
        &c,
    )
    .expect("spectrum");
    // Mean of rows 1..=8 is 4.5 in every column.
    let dc = spectrum.value(&[0]).expect("dc");
    assert!((dc - 4.5 * 16.0).abs() < 1e-9);
    assert_eq!(spectrum.shape(), Shape::Vector(9));
}

#[test]
fn new_derived_selects_output_type() {
    let c = ctx();
    let m: Data = Rc::new(ValMatrix::zeros(3, 7));
    let col = new_derived_with_context(
        Some(m.clone()),
        Rc::new(SliceOperation::new(SliceMode::Col, 0, 1)),
        &c,
    )
    .expect("column");
    assert_eq!(col.shape(), Shape::Vector(3));
    let same = new_derived_with_context(Some(m), Rc::new(Elementwise::abs()), &c).expect("matrix");
    assert_eq!(same.dims(), Dims::Matrix);
}

// ── Asynchronous path ─────────────────────────────────────────────────────

#[test]
fn autorun_on_worker_pool() {
    let c = MainContext::new(RuntimeConfig::default().with_workers(2).with_autorun(true));
    let input = ramp(64);
    let v = DerivedVector::with_context(
        Some(input.clone()),
        Rc::new(Elementwise::new("square", |x| x * x)),
        &c,
    )
    .expect("vector");
    assert_eq!(v.state(), BindingState::Running);
    assert!(c.run_until_idle(Duration::from_secs(10)));
    assert_eq!(v.value(&[8]), Ok(64.0));

    input.update(|d| d[8] = 3.0);
    assert!(c.run_until_idle(Duration::from_secs(10)));
    assert_eq!(v.value(&[8]), Ok(9.0));
}

#[test]
fn snapshot_of_struct_with_derived_member() {
    let input = ramp(4);
    let doubled = DerivedVector::with_context(
        Some(input),
        Rc::new(Elementwise::new("double", |x| 2.0 * x)),
        &ctx(),
    )
    .expect("vector");
    let group = StructData::new();
    group.insert("doubled", doubled);
    group.insert("gain", Rc::new(ValScalar::new(0.5)));

    let Some(CellSnapshot::Struct { members }) = snapshot(&group) else {
        panic!("expected struct snapshot");
    };
    assert_eq!(
        members.get("doubled"),
        Some(&CellSnapshot::Vector {
            values: vec![0.0, 2.0, 4.0, 6.0]
        })
    );
}
