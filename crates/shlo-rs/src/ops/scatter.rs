//! Generalized scatter with additive accumulation.
//!
//! The resolver walks the update coordinate space and maps every update
//! element to a result coordinate, or drops it. The bounds policy is the
//! mirror image of gather's: out-of-range targets are silently discarded,
//! never clamped into range. The two policies are intentionally
//! asymmetric (reads clamp, writes drop) and must not be unified.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::backend::spec::{ArrayBackend, SpecError, SpecErrorCode};
use crate::ops::common::{
    check_disjoint, check_in_range, check_rank, check_unique, ensure_dtype_equals,
    ensure_same_backend, ensure_shape_matches, index_column_handles, read_index_vector,
};
use crate::ops::index_space::{Coordinate, IndexSpace, MAX_RANK};
use crate::tensor::{DType, DeviceArray, Shape, Tensor};

/// Axis-role tables for one scatter instance.
///
/// Window extents are not listed separately: they are the extents of the
/// update arrays at `update_window_dims`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScatterDimensionNumbers {
    /// Update axes that index within the window written into an input.
    pub update_window_dims: Vec<usize>,
    /// Input axes whose window is always size 1 and which therefore have
    /// no update window axis of their own.
    pub inserted_window_dims: Vec<usize>,
    /// Input axes paired positionally with `scatter_indices_batching_dims`.
    pub input_batching_dims: Vec<usize>,
    /// Scatter-indices axes paired positionally with `input_batching_dims`.
    pub scatter_indices_batching_dims: Vec<usize>,
    /// Maps each component of the flattened index vector to the input
    /// axis it perturbs.
    pub scatter_dims_to_operand_dims: Vec<usize>,
    /// Axis of the scatter-indices array holding index-vector components;
    /// equal to the scatter-indices rank when every index is a scalar.
    pub index_vector_dim: usize,
}

impl ScatterDimensionNumbers {
    /// Validates the descriptor against the participating shapes. Runs
    /// once per scatter call, before any element is resolved.
    pub fn validate(
        &self,
        input_dims: &[usize],
        indices_dims: &[usize],
        update_dims: &[usize],
    ) -> Result<(), SpecError> {
        let input_rank = input_dims.len();
        let indices_rank = indices_dims.len();
        let update_rank = update_dims.len();
        check_rank("input", input_rank)?;
        check_rank("scatter_indices", indices_rank)?;
        check_rank("updates", update_rank)?;

        if self.index_vector_dim > indices_rank {
            return Err(SpecError::new(
                SpecErrorCode::IndexVectorDimOutOfRange,
                format!(
                    "index_vector_dim {} with scatter_indices rank {}",
                    self.index_vector_dim, indices_rank
                ),
            ));
        }

        check_unique("update_window_dims", &self.update_window_dims)?;
        check_in_range("update_window_dims", &self.update_window_dims, update_rank)?;
        check_unique("inserted_window_dims", &self.inserted_window_dims)?;
        check_in_range("inserted_window_dims", &self.inserted_window_dims, input_rank)?;
        check_unique("input_batching_dims", &self.input_batching_dims)?;
        check_in_range("input_batching_dims", &self.input_batching_dims, input_rank)?;
        check_disjoint(
            "inserted_window_dims",
            &self.inserted_window_dims,
            "input_batching_dims",
            &self.input_batching_dims,
        )?;
        check_unique(
            "scatter_indices_batching_dims",
            &self.scatter_indices_batching_dims,
        )?;
        check_in_range(
            "scatter_indices_batching_dims",
            &self.scatter_indices_batching_dims,
            indices_rank,
        )?;
        if self
            .scatter_indices_batching_dims
            .contains(&self.index_vector_dim)
        {
            return Err(SpecError::new(
                SpecErrorCode::OverlappingDimensionRoles,
                "scatter_indices_batching_dims may not include index_vector_dim".to_string(),
            ));
        }
        if self.input_batching_dims.len() != self.scatter_indices_batching_dims.len() {
            return Err(SpecError::new(
                SpecErrorCode::DimensionNumbersLengthMismatch,
                format!(
                    "{} input batching axes paired with {} scatter-indices batching axes",
                    self.input_batching_dims.len(),
                    self.scatter_indices_batching_dims.len()
                ),
            ));
        }

        let vector_len = if self.index_vector_dim < indices_rank {
            indices_dims[self.index_vector_dim]
        } else {
            1
        };
        check_unique(
            "scatter_dims_to_operand_dims",
            &self.scatter_dims_to_operand_dims,
        )?;
        check_in_range(
            "scatter_dims_to_operand_dims",
            &self.scatter_dims_to_operand_dims,
            input_rank,
        )?;
        if self.scatter_dims_to_operand_dims.len() != vector_len {
            return Err(SpecError::new(
                SpecErrorCode::DimensionNumbersLengthMismatch,
                format!(
                    "scatter_dims_to_operand_dims has {} entries, index vector length is {vector_len}",
                    self.scatter_dims_to_operand_dims.len()
                ),
            ));
        }

        // Every input axis is either batched, inserted, or owned by
        // exactly one update window axis.
        let windowed =
            input_rank - self.inserted_window_dims.len() - self.input_batching_dims.len();
        if self.update_window_dims.len() != windowed {
            return Err(SpecError::new(
                SpecErrorCode::DimensionNumbersLengthMismatch,
                format!(
                    "{} update window axes for {windowed} windowed input axes",
                    self.update_window_dims.len()
                ),
            ));
        }
        let implicit_scatter = indices_rank - usize::from(self.index_vector_dim < indices_rank);
        if update_rank - self.update_window_dims.len() != implicit_scatter {
            return Err(SpecError::new(
                SpecErrorCode::DimensionNumbersLengthMismatch,
                format!(
                    "updates have {} scatter axes, scatter_indices provide {implicit_scatter}",
                    update_rank - self.update_window_dims.len()
                ),
            ));
        }

        // The update scatter extents must match the scatter-indices
        // extents with the vector axis removed, in order.
        let scatter_dims = self.update_scatter_dims(update_rank);
        let mut scatter_slots = scatter_dims.iter();
        for (axis, &extent) in indices_dims.iter().enumerate() {
            if axis == self.index_vector_dim {
                continue;
            }
            let update_dim = *scatter_slots.next().expect("scatter axis per indices axis");
            if update_dims[update_dim] != extent {
                return Err(SpecError::new(
                    SpecErrorCode::ShapeMismatch,
                    format!(
                        "updates axis {update_dim} has extent {}, scatter_indices axis {axis} has {extent}",
                        update_dims[update_dim]
                    ),
                ));
            }
        }
        for (&input_axis, &indices_axis) in self
            .input_batching_dims
            .iter()
            .zip(&self.scatter_indices_batching_dims)
        {
            if input_dims[input_axis] != indices_dims[indices_axis] {
                return Err(SpecError::new(
                    SpecErrorCode::ShapeMismatch,
                    format!(
                        "batching pair ({input_axis}, {indices_axis}) has extents {} and {}",
                        input_dims[input_axis], indices_dims[indices_axis]
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Update axes that are not window axes, ascending.
    pub fn update_scatter_dims(&self, update_rank: usize) -> Vec<usize> {
        (0..update_rank)
            .filter(|d| !self.update_window_dims.contains(d))
            .collect()
    }
}

/// One recorded update: which update element lands where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedScatter {
    pub update_index: Coordinate,
    pub result_index: Coordinate,
}

/// Pure scatter index resolution: maps every update coordinate to its
/// result coordinate, dropping coordinates that land out of bounds.
///
/// Resolution happens in `i64`; a component below zero or at or above
/// the matching input extent discards the whole update coordinate. The
/// returned pairs preserve row-major update order, which is the
/// accumulation encounter order.
pub fn resolve(
    input_dims: &[usize],
    scatter_indices: &Tensor,
    dims: &ScatterDimensionNumbers,
    update_dims: &[usize],
) -> Result<Vec<ResolvedScatter>, SpecError> {
    dims.validate(input_dims, scatter_indices.shape().dims(), update_dims)?;

    let input_rank = input_dims.len();
    let scatter_dims = dims.update_scatter_dims(update_dims.len());
    let space = IndexSpace::new(update_dims)?;
    let mut resolved = Vec::new();

    'updates: for update_index in space.iter() {
        let update_scatter_index: Coordinate =
            scatter_dims.iter().map(|&d| update_index[d]).collect();
        let start_index =
            read_index_vector(scatter_indices, &update_scatter_index, dims.index_vector_dim);

        let mut full_start_index: SmallVec<[i64; MAX_RANK]> = SmallVec::from_elem(0, input_rank);
        for (component, &input_axis) in dims.scatter_dims_to_operand_dims.iter().enumerate() {
            // No clamp here, unlike gather: range violations surface at
            // the discard check below.
            full_start_index[input_axis] = start_index[component];
        }

        let mut full_batching_index: SmallVec<[i64; MAX_RANK]> =
            SmallVec::from_elem(0, input_rank);
        for (&input_axis, &indices_axis) in dims
            .input_batching_dims
            .iter()
            .zip(&dims.scatter_indices_batching_dims)
        {
            let slot = if indices_axis < dims.index_vector_dim {
                indices_axis
            } else {
                indices_axis - 1
            };
            full_batching_index[input_axis] = update_scatter_index[slot] as i64;
        }

        let mut full_window_index: SmallVec<[i64; MAX_RANK]> = SmallVec::from_elem(0, input_rank);
        let mut window_slots = dims
            .update_window_dims
            .iter()
            .map(|&d| update_index[d] as i64);
        for axis in 0..input_rank {
            if dims.inserted_window_dims.contains(&axis)
                || dims.input_batching_dims.contains(&axis)
            {
                continue;
            }
            full_window_index[axis] = window_slots
                .next()
                .expect("window component for every windowed input axis");
        }

        let mut result_index: Coordinate = Coordinate::with_capacity(input_rank);
        for axis in 0..input_rank {
            let component =
                full_start_index[axis] + full_batching_index[axis] + full_window_index[axis];
            if component < 0 || component >= input_dims[axis] as i64 {
                // Out of bounds: this update contributes nothing.
                continue 'updates;
            }
            result_index.push(component as usize);
        }
        resolved.push(ResolvedScatter {
            update_index,
            result_index,
        });
    }
    Ok(resolved)
}

/// Scatter as a batched apply: resolves every update element, gathers
/// the contributing update values in recorded order, and issues a single
/// scatter-with-addition per input array. Duplicate targets accumulate
/// by summation.
pub fn scatter<B: ArrayBackend + 'static>(
    inputs: &[DeviceArray<B>],
    scatter_indices: &DeviceArray<B>,
    updates: &[DeviceArray<B>],
    dims: &ScatterDimensionNumbers,
    result_shape: &Shape,
) -> Result<Vec<DeviceArray<B>>> {
    ensure!(!inputs.is_empty(), "scatter requires at least one input");
    ensure!(
        inputs.len() == updates.len(),
        "scatter pairs {} inputs with {} update arrays",
        inputs.len(),
        updates.len()
    );
    let backend = ensure_same_backend("scatter", &inputs[0], scatter_indices)?;
    ensure_dtype_equals("scatter_indices", scatter_indices, DType::I32)?;
    for (input, update) in inputs.iter().zip(updates) {
        ensure_same_backend("scatter", &inputs[0], input)?;
        ensure_same_backend("scatter", &inputs[0], update)?;
        ensure!(
            input.shape().dims() == result_shape.dims(),
            "scatter input shape {:?} must match result shape {:?}",
            input.shape().dims(),
            result_shape.dims()
        );
        ensure_shape_matches("updates", update, "updates[0]", &updates[0])?;
        ensure!(
            input.dtype() == update.dtype(),
            "scatter input dtype {:?} must match update dtype {:?}",
            input.dtype(),
            update.dtype()
        );
    }

    let indices_host = scatter_indices.to_host()?;
    let resolved = resolve(
        result_shape.dims(),
        &indices_host,
        dims,
        updates[0].shape().dims(),
    )?;

    // Nothing landed in range: the inputs pass through unchanged.
    if resolved.is_empty() {
        return Ok(inputs.to_vec());
    }

    let update_rank = updates[0].shape().rank();
    let input_rank = result_shape.rank();
    let mut update_columns: Vec<Vec<i32>> = (0..update_rank)
        .map(|_| Vec::with_capacity(resolved.len()))
        .collect();
    let mut result_columns: Vec<Vec<i32>> = (0..input_rank)
        .map(|_| Vec::with_capacity(resolved.len()))
        .collect();
    for entry in &resolved {
        for (axis, &component) in entry.update_index.iter().enumerate() {
            update_columns[axis].push(component as i32);
        }
        for (axis, &component) in entry.result_index.iter().enumerate() {
            result_columns[axis].push(component as i32);
        }
    }
    let update_handles = index_column_handles(backend.as_ref(), update_columns)?;
    let result_handles = index_column_handles(backend.as_ref(), result_columns)?;

    let update_axes: Vec<usize> = (0..update_rank).collect();
    let unit_sizes = vec![1usize; update_rank];
    let input_axes: Vec<usize> = (0..input_rank).collect();
    let mut picked_dims = vec![1usize; 1 + input_rank];
    picked_dims[0] = resolved.len();

    let mut results = Vec::with_capacity(inputs.len());
    for (input, update) in inputs.iter().zip(updates) {
        let picked = backend.gather(update.handle(), &update_handles, &update_axes, &unit_sizes)?;
        let picked = backend.reshape(&picked, &picked_dims)?;
        let out = backend.scatter_add(input.handle(), &result_handles, &picked, &input_axes)?;
        results.push(DeviceArray::from_handle(
            backend.clone(),
            result_shape.clone(),
            input.dtype(),
            out,
        ));
    }
    Ok(results)
}
