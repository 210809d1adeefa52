//! Generalized gather: one operand coordinate per result coordinate.
//!
//! The resolver walks the full result coordinate space and reconciles
//! batching axes, offset/window axes, collapsed axes, and the index
//! vector into a single operand coordinate per element. Out-of-range
//! start indices are clamped into the valid window range; gather never
//! discards (the write-side policy is the opposite, see
//! [`crate::ops::scatter`]).

use anyhow::Result;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::backend::spec::{ArrayBackend, SpecError, SpecErrorCode};
use crate::ops::common::{
    check_disjoint, check_in_range, check_rank, check_unique, ensure_dtype_equals,
    ensure_same_backend, index_column_handles, read_index_vector,
};
use crate::ops::index_space::{Coordinate, IndexSpace, MAX_RANK};
use crate::tensor::{DType, DeviceArray, Shape, Tensor};

/// Axis-role tables for one gather instance. Pure data, no behavior
/// beyond eager validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatherDimensionNumbers {
    /// Result axes that index within a slice taken from the operand.
    pub offset_dims: Vec<usize>,
    /// Operand axes whose window is always size 1 and which therefore
    /// have no offset axis of their own.
    pub collapsed_slice_dims: Vec<usize>,
    /// Operand axes paired positionally with `start_indices_batching_dims`.
    pub operand_batching_dims: Vec<usize>,
    /// Start-indices axes paired positionally with `operand_batching_dims`.
    pub start_indices_batching_dims: Vec<usize>,
    /// Maps each component of the flattened index vector to the operand
    /// axis it perturbs.
    pub start_index_map: Vec<usize>,
    /// Axis of the start-indices array holding index-vector components;
    /// equal to the start-indices rank when every index is a scalar.
    pub index_vector_dim: usize,
    /// Per-operand-axis window extent.
    pub slice_sizes: Vec<usize>,
}

impl GatherDimensionNumbers {
    /// Validates the descriptor against the participating shapes.
    ///
    /// Runs once per gather call, before any element is resolved, so a
    /// malformed descriptor fails fast instead of silently producing
    /// colliding coordinates.
    pub fn validate(
        &self,
        operand_dims: &[usize],
        indices_dims: &[usize],
        result_dims: &[usize],
    ) -> Result<(), SpecError> {
        let operand_rank = operand_dims.len();
        let indices_rank = indices_dims.len();
        let result_rank = result_dims.len();
        check_rank("operand", operand_rank)?;
        check_rank("start_indices", indices_rank)?;
        check_rank("result", result_rank)?;

        if self.index_vector_dim > indices_rank {
            return Err(SpecError::new(
                SpecErrorCode::IndexVectorDimOutOfRange,
                format!(
                    "index_vector_dim {} with start_indices rank {}",
                    self.index_vector_dim, indices_rank
                ),
            ));
        }

        check_unique("offset_dims", &self.offset_dims)?;
        check_in_range("offset_dims", &self.offset_dims, result_rank)?;
        check_unique("collapsed_slice_dims", &self.collapsed_slice_dims)?;
        check_in_range("collapsed_slice_dims", &self.collapsed_slice_dims, operand_rank)?;
        check_unique("operand_batching_dims", &self.operand_batching_dims)?;
        check_in_range("operand_batching_dims", &self.operand_batching_dims, operand_rank)?;
        check_disjoint(
            "collapsed_slice_dims",
            &self.collapsed_slice_dims,
            "operand_batching_dims",
            &self.operand_batching_dims,
        )?;
        check_unique("start_indices_batching_dims", &self.start_indices_batching_dims)?;
        check_in_range(
            "start_indices_batching_dims",
            &self.start_indices_batching_dims,
            indices_rank,
        )?;
        if self
            .start_indices_batching_dims
            .contains(&self.index_vector_dim)
        {
            return Err(SpecError::new(
                SpecErrorCode::OverlappingDimensionRoles,
                "start_indices_batching_dims may not include index_vector_dim".to_string(),
            ));
        }
        if self.operand_batching_dims.len() != self.start_indices_batching_dims.len() {
            return Err(SpecError::new(
                SpecErrorCode::DimensionNumbersLengthMismatch,
                format!(
                    "{} operand batching axes paired with {} start-indices batching axes",
                    self.operand_batching_dims.len(),
                    self.start_indices_batching_dims.len()
                ),
            ));
        }

        if self.slice_sizes.len() != operand_rank {
            return Err(SpecError::new(
                SpecErrorCode::DimensionNumbersLengthMismatch,
                format!(
                    "slice_sizes has {} entries, operand rank is {}",
                    self.slice_sizes.len(),
                    operand_rank
                ),
            ));
        }
        for (axis, (&size, &extent)) in self.slice_sizes.iter().zip(operand_dims).enumerate() {
            if size > extent {
                return Err(SpecError::new(
                    SpecErrorCode::SliceSizeOutOfRange,
                    format!("slice size {size} on operand axis {axis} with extent {extent}"),
                ));
            }
        }
        for &axis in self
            .collapsed_slice_dims
            .iter()
            .chain(&self.operand_batching_dims)
        {
            if self.slice_sizes[axis] != 1 {
                return Err(SpecError::new(
                    SpecErrorCode::SliceSizeOutOfRange,
                    format!(
                        "operand axis {axis} is collapsed or batched and must have slice size 1"
                    ),
                ));
            }
        }

        let vector_len = if self.index_vector_dim < indices_rank {
            indices_dims[self.index_vector_dim]
        } else {
            1
        };
        check_unique("start_index_map", &self.start_index_map)?;
        check_in_range("start_index_map", &self.start_index_map, operand_rank)?;
        if self.start_index_map.len() != vector_len {
            return Err(SpecError::new(
                SpecErrorCode::DimensionNumbersLengthMismatch,
                format!(
                    "start_index_map has {} entries, index vector length is {vector_len}",
                    self.start_index_map.len()
                ),
            ));
        }

        // Every operand axis is either batched, collapsed, or owned by
        // exactly one offset axis.
        let windowed =
            operand_rank - self.collapsed_slice_dims.len() - self.operand_batching_dims.len();
        if self.offset_dims.len() != windowed {
            return Err(SpecError::new(
                SpecErrorCode::DimensionNumbersLengthMismatch,
                format!(
                    "{} offset axes for {windowed} windowed operand axes",
                    self.offset_dims.len()
                ),
            ));
        }
        let implicit_batch = indices_rank - usize::from(self.index_vector_dim < indices_rank);
        if result_rank - self.offset_dims.len() != implicit_batch {
            return Err(SpecError::new(
                SpecErrorCode::DimensionNumbersLengthMismatch,
                format!(
                    "result has {} batch axes, start_indices provide {implicit_batch}",
                    result_rank - self.offset_dims.len()
                ),
            ));
        }

        // Cross-check the caller-specified result shape: offset extents
        // must equal the slice sizes of the windowed operand axes (in
        // ascending axis order) and batch extents must equal the
        // start-indices extents with the vector axis removed.
        let mut offset_slots = self.offset_dims.iter();
        for axis in 0..operand_rank {
            if self.collapsed_slice_dims.contains(&axis)
                || self.operand_batching_dims.contains(&axis)
            {
                continue;
            }
            let offset_dim = *offset_slots.next().expect("offset axis per windowed axis");
            if result_dims[offset_dim] != self.slice_sizes[axis] {
                return Err(SpecError::new(
                    SpecErrorCode::ShapeMismatch,
                    format!(
                        "result axis {offset_dim} has extent {}, slice size on operand axis {axis} is {}",
                        result_dims[offset_dim], self.slice_sizes[axis]
                    ),
                ));
            }
        }
        let batch_dims = self.batch_dims(result_rank);
        let mut batch_slots = batch_dims.iter();
        for (axis, &extent) in indices_dims.iter().enumerate() {
            if axis == self.index_vector_dim {
                continue;
            }
            let batch_dim = *batch_slots.next().expect("batch axis per indices axis");
            if result_dims[batch_dim] != extent {
                return Err(SpecError::new(
                    SpecErrorCode::ShapeMismatch,
                    format!(
                        "result axis {batch_dim} has extent {}, start_indices axis {axis} has {extent}",
                        result_dims[batch_dim]
                    ),
                ));
            }
        }
        for (&operand_axis, &indices_axis) in self
            .operand_batching_dims
            .iter()
            .zip(&self.start_indices_batching_dims)
        {
            if operand_dims[operand_axis] != indices_dims[indices_axis] {
                return Err(SpecError::new(
                    SpecErrorCode::ShapeMismatch,
                    format!(
                        "batching pair ({operand_axis}, {indices_axis}) has extents {} and {}",
                        operand_dims[operand_axis], indices_dims[indices_axis]
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Result axes that are not offset axes, ascending.
    pub fn batch_dims(&self, result_rank: usize) -> Vec<usize> {
        (0..result_rank)
            .filter(|d| !self.offset_dims.contains(d))
            .collect()
    }
}

/// One resolved element: where a result coordinate reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGather {
    pub result_index: Coordinate,
    pub operand_index: Coordinate,
}

/// Pure gather index resolution: maps every result coordinate to its
/// operand coordinate, in row-major result order.
///
/// No backend is involved; `start_indices` is host data. Out-of-range
/// start indices are clamped to `[0, extent - slice_size]` per axis —
/// that is the defined bounds policy for reads, never an error.
pub fn resolve(
    operand_dims: &[usize],
    start_indices: &Tensor,
    dims: &GatherDimensionNumbers,
    result_dims: &[usize],
) -> Result<Vec<ResolvedGather>, SpecError> {
    dims.validate(operand_dims, start_indices.shape().dims(), result_dims)?;

    let operand_rank = operand_dims.len();
    let batch_dims = dims.batch_dims(result_dims.len());
    let space = IndexSpace::new(result_dims)?;
    let mut resolved = Vec::with_capacity(space.num_coordinates());

    for result_index in space.iter() {
        let batch_index: Coordinate = batch_dims.iter().map(|&d| result_index[d]).collect();
        let start_index = read_index_vector(start_indices, &batch_index, dims.index_vector_dim);

        let mut full_start_index: SmallVec<[i64; MAX_RANK]> =
            SmallVec::from_elem(0, operand_rank);
        for (component, &operand_axis) in dims.start_index_map.iter().enumerate() {
            let max_start = (operand_dims[operand_axis] - dims.slice_sizes[operand_axis]) as i64;
            full_start_index[operand_axis] = start_index[component].clamp(0, max_start);
        }

        let mut full_batching_index: SmallVec<[i64; MAX_RANK]> =
            SmallVec::from_elem(0, operand_rank);
        for (&operand_axis, &indices_axis) in dims
            .operand_batching_dims
            .iter()
            .zip(&dims.start_indices_batching_dims)
        {
            // The index-vector axis is not a batch axis of `batch_index`,
            // so batching axes past it shift down by one.
            let slot = if indices_axis < dims.index_vector_dim {
                indices_axis
            } else {
                indices_axis - 1
            };
            full_batching_index[operand_axis] = batch_index[slot] as i64;
        }

        let mut full_offset_index: SmallVec<[i64; MAX_RANK]> =
            SmallVec::from_elem(0, operand_rank);
        let mut offset_slots = dims.offset_dims.iter().map(|&d| result_index[d] as i64);
        for axis in 0..operand_rank {
            if dims.operand_batching_dims.contains(&axis)
                || dims.collapsed_slice_dims.contains(&axis)
            {
                continue;
            }
            full_offset_index[axis] = offset_slots
                .next()
                .expect("offset component for every windowed operand axis");
        }

        // The three tables occupy disjoint axis sets, so the elementwise
        // sum is a merge.
        let operand_index: Coordinate = (0..operand_rank)
            .map(|axis| {
                (full_start_index[axis] + full_batching_index[axis] + full_offset_index[axis])
                    as usize
            })
            .collect();
        resolved.push(ResolvedGather {
            result_index,
            operand_index,
        });
    }
    Ok(resolved)
}

/// Gather as a batched apply: resolves every element, then issues a
/// single backend gather over per-axis index columns with unit windows
/// and reshapes to the caller-specified result shape.
pub fn gather<B: ArrayBackend + 'static>(
    operand: &DeviceArray<B>,
    start_indices: &DeviceArray<B>,
    dims: &GatherDimensionNumbers,
    result_shape: &Shape,
) -> Result<DeviceArray<B>> {
    let backend = ensure_same_backend("gather", operand, start_indices)?;
    ensure_dtype_equals("gather start_indices", start_indices, DType::I32)?;

    let indices_host = start_indices.to_host()?;
    let resolved = resolve(
        operand.shape().dims(),
        &indices_host,
        dims,
        result_shape.dims(),
    )?;

    let operand_rank = operand.shape().rank();
    let mut columns: Vec<Vec<i32>> = (0..operand_rank)
        .map(|_| Vec::with_capacity(resolved.len()))
        .collect();
    for entry in &resolved {
        for (axis, &component) in entry.operand_index.iter().enumerate() {
            columns[axis].push(component as i32);
        }
    }

    let index_handles = index_column_handles(backend.as_ref(), columns)?;
    let axes: Vec<usize> = (0..operand_rank).collect();
    let unit_sizes = vec![1usize; operand_rank];
    let gathered = backend.gather(operand.handle(), &index_handles, &axes, &unit_sizes)?;
    let reshaped = backend.reshape(&gathered, result_shape.dims())?;
    Ok(DeviceArray::from_handle(
        backend,
        result_shape.clone(),
        operand.dtype(),
        reshaped,
    ))
}
