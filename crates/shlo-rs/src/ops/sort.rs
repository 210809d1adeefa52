//! Sort along one axis, re-indexing every co-sorted array by a single
//! permutation.
//!
//! The permutation is computed once with a rank-preserving argsort of the
//! first input under the injected comparator, then every accompanying
//! array is gathered by it along the same axis. This replaces any
//! per-slice exchange scheme: one ordering pass, one re-index per array.

use anyhow::{ensure, Result};

use crate::backend::spec::{ArrayBackend, SortComparator};
use crate::ops::common::{ensure_same_backend, ensure_shape_matches};
use crate::ops::index_space::MAX_RANK;
use crate::tensor::DeviceArray;

/// Sorts `inputs` along `dimension` by the order of `inputs[0]`.
///
/// `dimension` may be negative, counting from the last axis. With
/// `SortComparator::GreaterThan` (the default instantiation used by the
/// drivers and tests) slices come out descending. When `is_stable` is
/// set, ties keep their original order.
pub fn sort<B: ArrayBackend + 'static>(
    inputs: &[DeviceArray<B>],
    dimension: isize,
    is_stable: bool,
    comparator: SortComparator,
) -> Result<Vec<DeviceArray<B>>> {
    ensure!(!inputs.is_empty(), "sort requires at least one input");
    let rank = inputs[0].shape().rank();
    ensure!(
        rank <= MAX_RANK,
        "sort input rank {rank} exceeds the supported ceiling of {MAX_RANK}"
    );
    let axis = if dimension < 0 {
        dimension + rank as isize
    } else {
        dimension
    };
    ensure!(
        (0..rank as isize).contains(&axis),
        "sort dimension {dimension} out of range for rank {rank}"
    );
    let axis = axis as usize;

    let backend = inputs[0].backend();
    for input in &inputs[1..] {
        ensure_same_backend("sort", &inputs[0], input)?;
        ensure_shape_matches("sort input", input, "sort input[0]", &inputs[0])?;
    }

    let order = backend.argsort(inputs[0].handle(), axis, comparator, is_stable)?;

    let mut results = Vec::with_capacity(inputs.len());
    for input in inputs {
        let reordered = backend.take_along_axis(input.handle(), &order, axis)?;
        results.push(DeviceArray::from_handle(
            backend.clone(),
            input.shape().clone(),
            input.dtype(),
            reordered,
        ));
    }
    Ok(results)
}
