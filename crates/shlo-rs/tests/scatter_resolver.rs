//! The pure scatter resolver, exercised without any backend.

use std::collections::HashMap;

use shlo_rs::backend::spec::SpecErrorCode;
use shlo_rs::ops::scatter::{resolve, ScatterDimensionNumbers};
use shlo_rs::{Shape, Tensor};

const INPUT_DIMS: [usize; 4] = [2, 3, 4, 2];
const UPDATE_DIMS: [usize; 5] = [2, 2, 3, 2, 2];

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

fn fixture_dims() -> ScatterDimensionNumbers {
    ScatterDimensionNumbers {
        update_window_dims: vec![3, 4],
        inserted_window_dims: vec![1],
        input_batching_dims: vec![0],
        scatter_indices_batching_dims: vec![1],
        scatter_dims_to_operand_dims: vec![2, 1],
        index_vector_dim: 3,
    }
}

#[test]
fn resolves_reference_fixture_pairs() {
    let resolved = resolve(
        &INPUT_DIMS,
        &fixture_indices(),
        &fixture_dims(),
        &UPDATE_DIMS,
    )
    .unwrap();
    // 48 update elements, one block of four resolves out of range.
    assert_eq!(resolved.len(), 44);
    for entry in &resolved {
        for (axis, &component) in entry.result_index.iter().enumerate() {
            assert!(component < INPUT_DIMS[axis]);
        }
    }
    // The dropped block is the one reading index vector (0, 9).
    assert!(!resolved
        .iter()
        .any(|e| e.update_index[0] == 0 && e.update_index[1] == 1 && e.update_index[2] == 2));
}

#[test]
fn duplicate_targets_preserve_hit_counts() {
    let resolved = resolve(
        &INPUT_DIMS,
        &fixture_indices(),
        &fixture_dims(),
        &UPDATE_DIMS,
    )
    .unwrap();
    let mut counts: HashMap<Vec<usize>, usize> = HashMap::new();
    for entry in &resolved {
        *counts.entry(entry.result_index.to_vec()).or_default() += 1;
    }
    assert_eq!(counts.get(&vec![0, 0, 0, 0]), Some(&2));
    assert_eq!(counts.get(&vec![0, 0, 1, 0]), Some(&3));
    assert_eq!(counts.get(&vec![1, 1, 1, 1]), Some(&3));
    assert_eq!(counts.get(&vec![0, 2, 3, 1]), Some(&1));
    // Positions nothing maps to receive no pair at all.
    assert_eq!(counts.get(&vec![0, 2, 0, 0]), None);
}

#[test]
fn encounter_order_is_row_major_over_updates() {
    let resolved = resolve(
        &INPUT_DIMS,
        &fixture_indices(),
        &fixture_dims(),
        &UPDATE_DIMS,
    )
    .unwrap();
    let flats: Vec<usize> = resolved
        .iter()
        .map(|entry| {
            entry
                .update_index
                .iter()
                .zip(&[24usize, 12, 4, 2, 1])
                .map(|(c, s)| c * s)
                .sum()
        })
        .collect();
    assert!(flats.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn discards_negative_targets() {
    let indices = Tensor::from_i32(Shape::new([2, 1]), vec![-1, 1]).unwrap();
    let dims = ScatterDimensionNumbers {
        update_window_dims: vec![1],
        inserted_window_dims: vec![],
        input_batching_dims: vec![],
        scatter_indices_batching_dims: vec![],
        scatter_dims_to_operand_dims: vec![0],
        index_vector_dim: 1,
    };
    let resolved = resolve(&[3], &indices, &dims, &[2, 1]).unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].result_index.as_slice(), &[1]);
}

#[test]
fn resolves_to_nothing_when_every_target_is_out_of_range() {
    let indices = Tensor::from_i32(Shape::new([2, 1]), vec![7, 9]).unwrap();
    let dims = ScatterDimensionNumbers {
        update_window_dims: vec![1],
        inserted_window_dims: vec![],
        input_batching_dims: vec![],
        scatter_indices_batching_dims: vec![],
        scatter_dims_to_operand_dims: vec![0],
        index_vector_dim: 1,
    };
    let resolved = resolve(&[3], &indices, &dims, &[2, 1]).unwrap();
    assert!(resolved.is_empty());
}

#[test]
fn rejects_overlapping_axis_roles() {
    let mut dims = fixture_dims();
    dims.input_batching_dims = vec![1];
    let err = resolve(
        &INPUT_DIMS,
        &fixture_indices(),
        &dims,
        &UPDATE_DIMS,
    )
    .unwrap_err();
    assert_eq!(err.code, SpecErrorCode::OverlappingDimensionRoles);
}

#[test]
fn rejects_update_shape_disagreeing_with_indices() {
    let err = resolve(
        &INPUT_DIMS,
        &fixture_indices(),
        &fixture_dims(),
        &[2, 2, 2, 2, 2],
    )
    .unwrap_err();
    assert_eq!(err.code, SpecErrorCode::ShapeMismatch);
}

#[test]
fn rejects_duplicate_window_axis() {
    let mut dims = fixture_dims();
    dims.update_window_dims = vec![3, 3];
    let err = resolve(
        &INPUT_DIMS,
        &fixture_indices(),
        &dims,
        &UPDATE_DIMS,
    )
    .unwrap_err();
    assert_eq!(err.code, SpecErrorCode::DuplicateDimensionRole);
}

#[test]
fn descriptor_serializes_round_trip() {
    let dims = fixture_dims();
    let json = serde_json::to_string(&dims).unwrap();
    let back: ScatterDimensionNumbers = serde_json::from_str(&json).unwrap();
    assert_eq!(dims, back);
}
