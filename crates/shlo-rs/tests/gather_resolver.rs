//! The pure gather resolver, exercised without any backend.

use shlo_rs::backend::spec::SpecErrorCode;
use shlo_rs::ops::gather::{resolve, GatherDimensionNumbers};
use shlo_rs::ops::IndexSpace;
use shlo_rs::{Shape, Tensor};

const OPERAND_DIMS: [usize; 4] = [2, 3, 4, 2];
const RESULT_DIMS: [usize; 5] = [2, 2, 3, 2, 2];

fn fixture_indices() -> Tensor {
    Tensor::from_i32(
        Shape::new([2, 2, 3, 2]),
        vec![
            0, 0, 1, 0, 2, 1, 0, 1, 1, 1, 0, 9, //
            0, 0, 2, 1, 2, 2, 1, 2, 0, 1, 1, 0,
        ],
    )
    .unwrap()
}

fn fixture_dims() -> GatherDimensionNumbers {
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

/// Dense fixture result, from the reference resolution algorithm.
const EXPECTED: [i32; 48] = [
    1, 2, 3, 4, 3, 4, 5, 6, 13, 14, 15, 16, 33, 34, 35, 36, 35, 36, 37, 38, 41, 42, 43, 44, 1, 2,
    3, 4, 13, 14, 15, 16, 21, 22, 23, 24, 43, 44, 45, 46, 33, 34, 35, 36, 27, 28, 29, 30,
];

#[test]
fn resolves_reference_fixture_coordinates() {
    let resolved = resolve(
        &OPERAND_DIMS,
        &fixture_indices(),
        &fixture_dims(),
        &RESULT_DIMS,
    )
    .unwrap();
    assert_eq!(resolved.len(), 48);

    // Resolution follows row-major result order.
    let expected_order: Vec<_> = IndexSpace::new(&RESULT_DIMS).unwrap().iter().collect();
    for (entry, expected_result_index) in resolved.iter().zip(expected_order) {
        assert_eq!(entry.result_index, expected_result_index);
    }

    // Reading the operand (sequential fill 1..=48) at each resolved
    // coordinate reproduces the golden dense result.
    let operand = Tensor::iota_i32(Shape::new(OPERAND_DIMS), 1);
    let values: Vec<i32> = resolved
        .iter()
        .map(|entry| operand.i32_at(&entry.operand_index))
        .collect();
    assert_eq!(values, EXPECTED);
}

#[test]
fn clamp_invariant_holds_for_every_element() {
    let dims = fixture_dims();
    let resolved = resolve(&OPERAND_DIMS, &fixture_indices(), &dims, &RESULT_DIMS).unwrap();
    // Every resolved coordinate stays inside the operand even though the
    // fixture contains a start index of 9.
    for entry in &resolved {
        for (axis, &component) in entry.operand_index.iter().enumerate() {
            assert!(
                component < OPERAND_DIMS[axis],
                "component {component} escapes axis {axis}"
            );
        }
    }
}

#[test]
fn clamps_to_the_last_valid_window_start() {
    let indices = Tensor::from_i32(Shape::new([2, 1]), vec![-5, 99]).unwrap();
    let dims = GatherDimensionNumbers {
        offset_dims: vec![1],
        collapsed_slice_dims: vec![],
        operand_batching_dims: vec![],
        start_indices_batching_dims: vec![],
        start_index_map: vec![0],
        index_vector_dim: 1,
        slice_sizes: vec![2],
    };
    let resolved = resolve(&[4], &indices, &dims, &[2, 2]).unwrap();
    let starts: Vec<usize> = resolved.iter().map(|e| e.operand_index[0]).collect();
    // -5 clamps to 0; 99 clamps to extent - slice size = 2.
    assert_eq!(starts, vec![0, 1, 2, 3]);
}

#[test]
fn offset_assignment_is_order_preserving() {
    // Empty batching lists: the k-th non-collapsed operand axis
    // (ascending) receives the k-th offset component.
    let indices = Tensor::from_i32(Shape::new([2, 1]), vec![1, 0]).unwrap();
    let dims = GatherDimensionNumbers {
        offset_dims: vec![1, 2],
        collapsed_slice_dims: vec![1],
        operand_batching_dims: vec![],
        start_indices_batching_dims: vec![],
        start_index_map: vec![0],
        index_vector_dim: 1,
        slice_sizes: vec![2, 1, 3],
    };
    let resolved = resolve(&[3, 1, 5], &indices, &dims, &[2, 2, 3]).unwrap();
    for entry in &resolved {
        let r = &entry.result_index;
        let start = if r[0] == 0 { 1 } else { 0 };
        assert_eq!(entry.operand_index[0], start + r[1]);
        assert_eq!(entry.operand_index[1], 0);
        assert_eq!(entry.operand_index[2], r[2]);
    }
}

#[test]
fn rejects_duplicate_axis_in_one_role() {
    let mut dims = fixture_dims();
    dims.offset_dims = vec![3, 3];
    let err = resolve(&OPERAND_DIMS, &fixture_indices(), &dims, &RESULT_DIMS).unwrap_err();
    assert_eq!(err.code, SpecErrorCode::DuplicateDimensionRole);
}

#[test]
fn rejects_overlapping_axis_roles() {
    let mut dims = fixture_dims();
    dims.operand_batching_dims = vec![1];
    let err = resolve(&OPERAND_DIMS, &fixture_indices(), &dims, &RESULT_DIMS).unwrap_err();
    assert_eq!(err.code, SpecErrorCode::OverlappingDimensionRoles);
}

#[test]
fn rejects_slice_sizes_length_mismatch() {
    let mut dims = fixture_dims();
    dims.slice_sizes = vec![1, 1, 2];
    let err = resolve(&OPERAND_DIMS, &fixture_indices(), &dims, &RESULT_DIMS).unwrap_err();
    assert_eq!(err.code, SpecErrorCode::DimensionNumbersLengthMismatch);
}

#[test]
fn rejects_result_shape_disagreeing_with_window() {
    let err = resolve(
        &OPERAND_DIMS,
        &fixture_indices(),
        &fixture_dims(),
        &[2, 2, 3, 2, 1],
    )
    .unwrap_err();
    assert_eq!(err.code, SpecErrorCode::ShapeMismatch);
}

#[test]
fn rejects_rank_above_ceiling() {
    let indices = Tensor::from_i32(Shape::new([1]), vec![0]).unwrap();
    let dims = GatherDimensionNumbers {
        offset_dims: vec![],
        collapsed_slice_dims: (0..9).collect(),
        operand_batching_dims: vec![],
        start_indices_batching_dims: vec![],
        start_index_map: vec![0],
        index_vector_dim: 1,
        slice_sizes: vec![1; 9],
    };
    let err = resolve(&[1; 9], &indices, &dims, &[1]).unwrap_err();
    assert_eq!(err.code, SpecErrorCode::RankCeilingExceeded);
}

#[test]
fn descriptor_serializes_round_trip() {
    let dims = fixture_dims();
    let json = serde_json::to_string(&dims).unwrap();
    let back: GatherDimensionNumbers = serde_json::from_str(&json).unwrap();
    assert_eq!(dims, back);
}
