//! The worked reference fixture shared by the gather and scatter suites.
//!
//! Operand `[2,3,4,2]` filled `1..=48`, index array `[2,2,3,2]` with one
//! deliberately out-of-range component, batched on the leading axis. The
//! expected dense results were produced by the reference resolution
//! algorithm and are checked element-for-element rather than re-derived
//! in every test.

use shlo_rs::ops::{GatherDimensionNumbers, ScatterDimensionNumbers};
use shlo_rs::{Shape, Tensor};

pub const OPERAND_DIMS: [usize; 4] = [2, 3, 4, 2];
pub const INDICES_DIMS: [usize; 4] = [2, 2, 3, 2];
pub const GATHER_RESULT_DIMS: [usize; 5] = [2, 2, 3, 2, 2];

pub fn operand() -> Tensor {
    Tensor::iota_i32(Shape::new(OPERAND_DIMS), 1)
}

pub fn start_indices() -> Tensor {
    Tensor::from_i32(
        Shape::new(INDICES_DIMS),
        vec![
            0, 0, 1, 0, 2, 1, 0, 1, 1, 1, 0, 9, //
            0, 0, 2, 1, 2, 2, 1, 2, 0, 1, 1, 0,
        ],
    )
    .expect("index fixture")
}

pub fn gather_dims() -> GatherDimensionNumbers {
    GatherDimensionNumbers {
        offset_dims: vec![3, 4],
        collapsed_slice_dims: vec![1],
        operand_batching_dims: vec![0],
        start_indices_batching_dims: vec![1],
        start_index_map: vec![2, 1],
        index_vector_dim: 3,
        slice_sizes: vec![1, 1, 2, 2],
    }
}

pub fn scatter_dims() -> ScatterDimensionNumbers {
    ScatterDimensionNumbers {
        update_window_dims: vec![3, 4],
        inserted_window_dims: vec![1],
        input_batching_dims: vec![0],
        scatter_indices_batching_dims: vec![1],
        scatter_dims_to_operand_dims: vec![2, 1],
        index_vector_dim: 3,
    }
}

/// Dense gather result for the fixture, row-major over `[2,2,3,2,2]`.
pub fn gather_expected() -> Vec<i32> {
    vec![
        1, 2, 3, 4, //
        3, 4, 5, 6, //
        13, 14, 15, 16, //
        33, 34, 35, 36, //
        35, 36, 37, 38, //
        41, 42, 43, 44, //
        1, 2, 3, 4, //
        13, 14, 15, 16, //
        21, 22, 23, 24, //
        43, 44, 45, 46, //
        33, 34, 35, 36, //
        27, 28, 29, 30,
    ]
}

/// Expected scatter result for constant-1 updates: the operand plus the
/// number of update coordinates landing on each position. One block of
/// four updates resolves out of range and contributes nothing.
pub fn scatter_expected() -> Vec<i32> {
    let mut values: Vec<i32> = (1..=48).collect();
    // ((batch, row, column), hits) applied at both positions of the last axis.
    let hits: [((usize, usize, usize), i32); 14] = [
        ((0, 0, 0), 2),
        ((0, 0, 1), 3),
        ((0, 0, 2), 1),
        ((0, 1, 2), 2),
        ((0, 1, 3), 2),
        ((0, 2, 2), 1),
        ((0, 2, 3), 1),
        ((1, 0, 1), 1),
        ((1, 0, 2), 1),
        ((1, 1, 0), 2),
        ((1, 1, 1), 3),
        ((1, 1, 2), 1),
        ((1, 2, 1), 1),
        ((1, 2, 2), 1),
    ];
    for ((batch, row, column), count) in hits {
        for last in 0..2 {
            values[batch * 24 + row * 8 + column * 2 + last] += count;
        }
    }
    values
}
