//! End-to-end sort suites over the argsort-permutation path.

use std::sync::Arc;

use shlo_rs::backend::spec::SortComparator;
use shlo_rs::ops;
use shlo_rs::{ArrayBackend, Shape, Tensor};

use crate::support::{device, readback_i32};

pub fn reorders_co_sorted_arrays<B: ArrayBackend + 'static>(backend: &Arc<B>) {
    let keys = device(
        backend,
        Tensor::from_i32(Shape::new([2, 3]), vec![1, 2, 3, 3, 2, 1]).unwrap(),
    );
    let payload = device(
        backend,
        Tensor::from_i32(Shape::new([2, 3]), vec![3, 2, 1, 1, 2, 3]).unwrap(),
    );
    let results = ops::sort(&[keys, payload], 0, true, SortComparator::GreaterThan).unwrap();
    assert_eq!(results.len(), 2);
    // Columns of the first input sort descending; the second input moves
    // by the same permutation.
    assert_eq!(readback_i32(&results[0]), vec![3, 2, 3, 1, 2, 1]);
    assert_eq!(readback_i32(&results[1]), vec![1, 2, 1, 3, 2, 3]);
}

pub fn ascending_along_negative_axis<B: ArrayBackend + 'static>(backend: &Arc<B>) {
    let keys = device(
        backend,
        Tensor::from_i32(Shape::new([2, 3]), vec![3, 1, 2, 6, 5, 4]).unwrap(),
    );
    let results = ops::sort(&[keys], -1, true, SortComparator::LessThan).unwrap();
    assert_eq!(readback_i32(&results[0]), vec![1, 2, 3, 4, 5, 6]);
}

pub fn is_stable_for_equal_keys<B: ArrayBackend + 'static>(backend: &Arc<B>) {
    let keys = device(
        backend,
        Tensor::from_i32(Shape::new([3]), vec![1, 1, 0]).unwrap(),
    );
    let payload = device(
        backend,
        Tensor::from_i32(Shape::new([3]), vec![10, 20, 30]).unwrap(),
    );
    let results = ops::sort(&[keys, payload], 0, true, SortComparator::LessThan).unwrap();
    assert_eq!(readback_i32(&results[0]), vec![0, 1, 1]);
    // Equal keys keep their original relative order.
    assert_eq!(readback_i32(&results[1]), vec![30, 10, 20]);
}
