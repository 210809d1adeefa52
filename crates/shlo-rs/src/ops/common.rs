//! Shared validation guards and index-vector access used by both resolvers.

use std::sync::Arc;

use anyhow::{bail, ensure, Result};
use smallvec::SmallVec;

use crate::backend::spec::{ArrayBackend, SpecError, SpecErrorCode, TensorInit};
use crate::ops::index_space::MAX_RANK;
use crate::tensor::{DType, DeviceArray, Shape, Tensor};

/// Verifies that two arrays live on the same backend instance and returns it.
pub(crate) fn ensure_same_backend<B: ArrayBackend + 'static>(
    op_name: &str,
    lhs: &DeviceArray<B>,
    rhs: &DeviceArray<B>,
) -> Result<Arc<B>> {
    let lhs_backend = lhs.backend();
    let rhs_backend = rhs.backend();

    if !Arc::ptr_eq(&lhs_backend, &rhs_backend) {
        bail!(
            "{} operands must be placed on the same backend: {} vs {}",
            op_name,
            lhs_backend.backend_name(),
            rhs_backend.backend_name()
        );
    }

    Ok(lhs_backend)
}

/// Guards against dtype mismatches before any backend traffic happens.
pub(crate) fn ensure_dtype_equals<B: ArrayBackend + 'static>(
    array_name: &str,
    array: &DeviceArray<B>,
    expected: DType,
) -> Result<()> {
    ensure!(
        array.dtype() == expected,
        "{array_name} must have dtype {:?}, got {:?}",
        expected,
        array.dtype()
    );
    Ok(())
}

/// Confirms two arrays share identical shapes.
pub(crate) fn ensure_shape_matches<B: ArrayBackend + 'static>(
    lhs_name: &str,
    lhs: &DeviceArray<B>,
    rhs_name: &str,
    rhs: &DeviceArray<B>,
) -> Result<()> {
    ensure!(
        lhs.shape().dims() == rhs.shape().dims(),
        "{lhs_name} shape {:?} must match {rhs_name} shape {:?}",
        lhs.shape().dims(),
        rhs.shape().dims()
    );
    Ok(())
}

/// Rejects ranks above the supported ceiling with a configuration error.
pub(crate) fn check_rank(what: &str, rank: usize) -> Result<(), SpecError> {
    if rank > MAX_RANK {
        return Err(SpecError::new(
            SpecErrorCode::RankCeilingExceeded,
            format!("{what} has rank {rank}, ceiling is {MAX_RANK}"),
        ));
    }
    Ok(())
}

/// Rejects axis lists that name the same axis twice.
pub(crate) fn check_unique(what: &str, axes: &[usize]) -> Result<(), SpecError> {
    for (i, a) in axes.iter().enumerate() {
        if axes[..i].contains(a) {
            return Err(SpecError::new(
                SpecErrorCode::DuplicateDimensionRole,
                format!("{what} lists axis {a} more than once"),
            ));
        }
    }
    Ok(())
}

/// Rejects axis lists pointing outside the owning array's rank.
pub(crate) fn check_in_range(what: &str, axes: &[usize], rank: usize) -> Result<(), SpecError> {
    for &a in axes {
        if a >= rank {
            return Err(SpecError::new(
                SpecErrorCode::DimensionOutOfRange,
                format!("{what} names axis {a}, rank is {rank}"),
            ));
        }
    }
    Ok(())
}

/// Rejects overlap between two axis-role lists over the same array.
pub(crate) fn check_disjoint(
    lhs_name: &str,
    lhs: &[usize],
    rhs_name: &str,
    rhs: &[usize],
) -> Result<(), SpecError> {
    for a in lhs {
        if rhs.contains(a) {
            return Err(SpecError::new(
                SpecErrorCode::OverlappingDimensionRoles,
                format!("axis {a} appears in both {lhs_name} and {rhs_name}"),
            ));
        }
    }
    Ok(())
}

/// Reads the (possibly absent) index vector for one batch position.
///
/// Every axis of `indices` other than `index_vector_dim` is fixed to the
/// corresponding `batch` component, in order; the full extent along
/// `index_vector_dim` is read and flattened. When `index_vector_dim`
/// equals the rank there is no vector axis and the result is the single
/// scalar at `batch`.
pub(crate) fn read_index_vector(
    indices: &Tensor,
    batch: &[usize],
    index_vector_dim: usize,
) -> SmallVec<[i64; MAX_RANK]> {
    let dims = indices.shape().dims();
    let rank = dims.len();
    let vector_len = if index_vector_dim < rank {
        dims[index_vector_dim]
    } else {
        1
    };

    let mut coord: SmallVec<[usize; MAX_RANK]> = SmallVec::with_capacity(rank);
    let mut batch_slots = batch.iter();
    for axis in 0..rank {
        if axis == index_vector_dim {
            coord.push(0);
        } else {
            coord.push(
                *batch_slots
                    .next()
                    .expect("batch component for every non-vector axis"),
            );
        }
    }

    let mut vector = SmallVec::with_capacity(vector_len);
    for component in 0..vector_len {
        if index_vector_dim < rank {
            coord[index_vector_dim] = component;
        }
        vector.push(indices.i32_at(&coord) as i64);
    }
    vector
}

/// Materialises one rank-1 `I32` index array per coordinate column.
pub(crate) fn index_column_handles<B: ArrayBackend>(
    backend: &B,
    columns: Vec<Vec<i32>>,
) -> Result<Vec<B::ArrayHandle>> {
    columns
        .into_iter()
        .map(|column| {
            let literal = Tensor::from_i32(Shape::new([column.len()]), column)?.to_literal();
            backend
                .materialize(TensorInit::Literal(literal))
                .map_err(anyhow::Error::from)
        })
        .collect()
}
