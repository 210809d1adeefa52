//! End-to-end scatter suites: accumulation, discard policy, pass-through,
//! and the gather/scatter round trip.

use std::sync::Arc;

use shlo_rs::ops::{self, GatherDimensionNumbers, ScatterDimensionNumbers};
use shlo_rs::{ArrayBackend, DeviceArray, Shape, Tensor};

use crate::fixtures;
use crate::support::{device, readback_i32};

pub fn matches_reference_fixture<B: ArrayBackend + 'static>(backend: &Arc<B>) {
    let input = device(backend, fixtures::operand());
    let scatter_indices = device(backend, fixtures::start_indices());
    let updates = device(
        backend,
        Tensor::full_i32(Shape::new(fixtures::GATHER_RESULT_DIMS), 1),
    );
    let results = ops::scatter(
        &[input],
        &scatter_indices,
        &[updates],
        &fixtures::scatter_dims(),
        &Shape::new(fixtures::OPERAND_DIMS),
    )
    .unwrap();
    assert_eq!(results.len(), 1);
    // Every in-range target grows by its hit count; untouched positions
    // keep their pre-scatter value.
    assert_eq!(readback_i32(&results[0]), fixtures::scatter_expected());
}

pub fn discards_out_of_range_targets<B: ArrayBackend + 'static>(backend: &Arc<B>) {
    let input = device(
        backend,
        Tensor::from_i32(Shape::new([3]), vec![1, 2, 3]).unwrap(),
    );
    let scatter_indices = device(
        backend,
        Tensor::from_i32(Shape::new([2, 1]), vec![1, 7]).unwrap(),
    );
    let updates = device(
        backend,
        Tensor::from_i32(Shape::new([2, 1]), vec![10, 20]).unwrap(),
    );
    let dims = ScatterDimensionNumbers {
        update_window_dims: vec![1],
        inserted_window_dims: vec![],
        input_batching_dims: vec![],
        scatter_indices_batching_dims: vec![],
        scatter_dims_to_operand_dims: vec![0],
        index_vector_dim: 1,
    };
    let results = ops::scatter(
        &[input],
        &scatter_indices,
        &[updates],
        &dims,
        &Shape::new([3]),
    )
    .unwrap();
    // Target 7 is dropped, never clamped into range.
    assert_eq!(readback_i32(&results[0]), vec![1, 12, 3]);
}

pub fn passes_through_when_nothing_lands<B: ArrayBackend + 'static>(backend: &Arc<B>) {
    let input = device(
        backend,
        Tensor::from_i32(Shape::new([3]), vec![1, 2, 3]).unwrap(),
    );
    let scatter_indices = device(
        backend,
        Tensor::from_i32(Shape::new([2, 1]), vec![7, 9]).unwrap(),
    );
    let updates = device(
        backend,
        Tensor::from_i32(Shape::new([2, 1]), vec![10, 20]).unwrap(),
    );
    let dims = ScatterDimensionNumbers {
        update_window_dims: vec![1],
        inserted_window_dims: vec![],
        input_batching_dims: vec![],
        scatter_indices_batching_dims: vec![],
        scatter_dims_to_operand_dims: vec![0],
        index_vector_dim: 1,
    };
    let results = ops::scatter(
        &[input],
        &scatter_indices,
        &[updates],
        &dims,
        &Shape::new([3]),
    )
    .unwrap();
    assert_eq!(readback_i32(&results[0]), vec![1, 2, 3]);
}

pub fn round_trip_restores_gathered_windows<B: ArrayBackend + 'static>(backend: &Arc<B>) {
    let operand = device(backend, Tensor::iota_i32(Shape::new([4, 3]), 1));
    let indices = device(
        backend,
        Tensor::from_i32(Shape::new([2, 1]), vec![0, 2]).unwrap(),
    );

    let gather_dims = GatherDimensionNumbers {
        offset_dims: vec![1, 2],
        collapsed_slice_dims: vec![],
        operand_batching_dims: vec![],
        start_indices_batching_dims: vec![],
        start_index_map: vec![0],
        index_vector_dim: 1,
        slice_sizes: vec![2, 3],
    };
    let windows = ops::gather(&operand, &indices, &gather_dims, &Shape::new([2, 2, 3])).unwrap();

    // Scatter the gathered windows back onto a zero array with the same
    // dimension numbers: the windows do not overlap, so addition
    // reproduces the operand exactly.
    let zero = DeviceArray::zeros(Arc::clone(backend), Shape::new([4, 3]), shlo_rs::DType::I32)
        .unwrap();
    let scatter_dims = ScatterDimensionNumbers {
        update_window_dims: vec![1, 2],
        inserted_window_dims: vec![],
        input_batching_dims: vec![],
        scatter_indices_batching_dims: vec![],
        scatter_dims_to_operand_dims: vec![0],
        index_vector_dim: 1,
    };
    let results = ops::scatter(
        &[zero],
        &indices,
        &[windows],
        &scatter_dims,
        &Shape::new([4, 3]),
    )
    .unwrap();
    assert_eq!(readback_i32(&results[0]), readback_i32(&operand));
}

pub fn applies_to_every_input_array<B: ArrayBackend + 'static>(backend: &Arc<B>) {
    let first = device(
        backend,
        Tensor::from_i32(Shape::new([2, 2]), vec![1, 2, 3, 4]).unwrap(),
    );
    let second = device(
        backend,
        Tensor::from_i32(Shape::new([2, 2]), vec![10, 20, 30, 40]).unwrap(),
    );
    let scatter_indices = device(
        backend,
        Tensor::from_i32(Shape::new([2, 1]), vec![0, 1]).unwrap(),
    );
    let first_updates = device(
        backend,
        Tensor::from_i32(Shape::new([2, 1, 1]), vec![5, 7]).unwrap(),
    );
    let second_updates = device(
        backend,
        Tensor::from_i32(Shape::new([2, 1, 1]), vec![100, 200]).unwrap(),
    );
    let dims = ScatterDimensionNumbers {
        update_window_dims: vec![1, 2],
        inserted_window_dims: vec![],
        input_batching_dims: vec![],
        scatter_indices_batching_dims: vec![],
        scatter_dims_to_operand_dims: vec![0],
        index_vector_dim: 1,
    };
    let results = ops::scatter(
        &[first, second],
        &scatter_indices,
        &[first_updates, second_updates],
        &dims,
        &Shape::new([2, 2]),
    )
    .unwrap();
    assert_eq!(readback_i32(&results[0]), vec![6, 2, 10, 4]);
    assert_eq!(readback_i32(&results[1]), vec![110, 20, 230, 40]);
}
