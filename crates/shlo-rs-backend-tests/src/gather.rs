//! End-to-end gather suites driven through the batched apply step.

use std::sync::Arc;

use shlo_rs::ops::{self, GatherDimensionNumbers};
use shlo_rs::{ArrayBackend, Shape, Tensor};

use crate::fixtures;
use crate::support::{device, readback_i32};

pub fn matches_reference_fixture<B: ArrayBackend + 'static>(backend: &Arc<B>) {
    let operand = device(backend, fixtures::operand());
    let start_indices = device(backend, fixtures::start_indices());
    let result = ops::gather(
        &operand,
        &start_indices,
        &fixtures::gather_dims(),
        &Shape::new(fixtures::GATHER_RESULT_DIMS),
    )
    .unwrap();
    assert_eq!(result.shape().dims(), fixtures::GATHER_RESULT_DIMS);
    assert_eq!(readback_i32(&result), fixtures::gather_expected());
}

pub fn clamps_out_of_range_start_indices<B: ArrayBackend + 'static>(backend: &Arc<B>) {
    let operand = device(
        backend,
        Tensor::from_i32(Shape::new([4]), vec![1, 2, 3, 4]).unwrap(),
    );
    let start_indices = device(
        backend,
        Tensor::from_i32(Shape::new([2, 1]), vec![-3, 9]).unwrap(),
    );
    let dims = GatherDimensionNumbers {
        offset_dims: vec![1],
        collapsed_slice_dims: vec![],
        operand_batching_dims: vec![],
        start_indices_batching_dims: vec![],
        start_index_map: vec![0],
        index_vector_dim: 1,
        slice_sizes: vec![2],
    };
    let result = ops::gather(&operand, &start_indices, &dims, &Shape::new([2, 2])).unwrap();
    // -3 clamps to 0, 9 clamps to the last valid window start.
    assert_eq!(readback_i32(&result), vec![1, 2, 3, 4]);
}

pub fn whole_elements_when_offset_dims_empty<B: ArrayBackend + 'static>(backend: &Arc<B>) {
    let operand = device(
        backend,
        Tensor::from_i32(Shape::new([3]), vec![10, 20, 30]).unwrap(),
    );
    let start_indices = device(
        backend,
        Tensor::from_i32(Shape::new([4]), vec![2, 0, 1, 2]).unwrap(),
    );
    let dims = GatherDimensionNumbers {
        offset_dims: vec![],
        collapsed_slice_dims: vec![0],
        operand_batching_dims: vec![],
        start_indices_batching_dims: vec![],
        start_index_map: vec![0],
        index_vector_dim: 1,
        slice_sizes: vec![1],
    };
    // With no offset axes the result shape is the batch shape and every
    // element is a plain lookup.
    let result = ops::gather(&operand, &start_indices, &dims, &Shape::new([4])).unwrap();
    assert_eq!(readback_i32(&result), vec![30, 10, 20, 30]);
}

pub fn rejects_overlapping_axis_roles<B: ArrayBackend + 'static>(backend: &Arc<B>) {
    let operand = device(backend, fixtures::operand());
    let start_indices = device(backend, fixtures::start_indices());
    let mut dims = fixtures::gather_dims();
    dims.operand_batching_dims = vec![1];
    let result = ops::gather(
        &operand,
        &start_indices,
        &dims,
        &Shape::new(fixtures::GATHER_RESULT_DIMS),
    );
    assert!(result.is_err(), "overlapping axis roles must fail fast");
}
