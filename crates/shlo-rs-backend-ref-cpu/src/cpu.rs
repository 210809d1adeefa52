//! Eager reference CPU backend.
//!
//! Correctness-first: every primitive is a plain strided loop over dense
//! row-major buffers. Index operands must already be in bounds — the
//! lowering layer owns the clamp/discard policies, so range violations
//! here are hard execution errors.

use std::cmp::Ordering;
use std::ops::AddAssign;
use std::sync::Arc;

use shlo_rs::backend::spec::{
    ArrayBackend, BackendError, BackendResult, ComparisonOp, DType, ElementwiseBinaryOp, Shape,
    SortComparator, SpecErrorCode, TensorInit, TensorLiteral, TensorSpec,
};
use shlo_rs::ops::IndexSpace;

/// Dense array handle owned by the CPU backend.
#[derive(Debug, Clone)]
pub struct CpuArray {
    pub spec: TensorSpec,
    pub data: ArrayData,
}

/// Typed storage behind a [`CpuArray`].
#[derive(Debug, Clone)]
pub enum ArrayData {
    F32(Arc<[f32]>),
    Si32(Arc<[i32]>),
    Bool(Arc<[u8]>),
}

/// The reference backend. Stateless; handles carry their own payload.
#[derive(Debug, Clone, Default)]
pub struct CpuBackend;

impl CpuBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ArrayBackend for CpuBackend {
    type ArrayHandle = CpuArray;

    fn backend_name(&self) -> &str {
        "cpu-reference"
    }

    fn materialize(&self, init: TensorInit) -> BackendResult<Self::ArrayHandle> {
        match init {
            TensorInit::Literal(literal) => literal_to_array(&literal),
            TensorInit::Zeroed(spec) => zeroed_array(&spec),
        }
    }

    fn to_literal(&self, array: &Self::ArrayHandle) -> BackendResult<TensorLiteral> {
        array_to_literal(array)
    }

    fn slice(
        &self,
        array: &Self::ArrayHandle,
        starts: &[usize],
        stops: &[usize],
    ) -> BackendResult<Self::ArrayHandle> {
        op_slice(array, starts, stops)
    }

    fn slice_update(
        &self,
        array: &Self::ArrayHandle,
        patch: &Self::ArrayHandle,
        starts: &[usize],
        stops: &[usize],
    ) -> BackendResult<Self::ArrayHandle> {
        op_slice_update(array, patch, starts, stops)
    }

    fn reshape(
        &self,
        array: &Self::ArrayHandle,
        new_dims: &[usize],
    ) -> BackendResult<Self::ArrayHandle> {
        op_reshape(array, new_dims)
    }

    fn gather(
        &self,
        array: &Self::ArrayHandle,
        indices: &[Self::ArrayHandle],
        axes: &[usize],
        slice_sizes: &[usize],
    ) -> BackendResult<Self::ArrayHandle> {
        op_gather(array, indices, axes, slice_sizes)
    }

    fn scatter_add(
        &self,
        array: &Self::ArrayHandle,
        indices: &[Self::ArrayHandle],
        updates: &Self::ArrayHandle,
        axes: &[usize],
    ) -> BackendResult<Self::ArrayHandle> {
        op_scatter_add(array, indices, updates, axes)
    }

    fn compare(
        &self,
        lhs: &Self::ArrayHandle,
        rhs: &Self::ArrayHandle,
        op: ComparisonOp,
    ) -> BackendResult<Self::ArrayHandle> {
        op_compare(lhs, rhs, op)
    }

    fn binary(
        &self,
        lhs: &Self::ArrayHandle,
        rhs: &Self::ArrayHandle,
        op: ElementwiseBinaryOp,
    ) -> BackendResult<Self::ArrayHandle> {
        op_binary(lhs, rhs, op)
    }

    fn reduce_sum(
        &self,
        array: &Self::ArrayHandle,
        axes: &[usize],
        keepdims: bool,
    ) -> BackendResult<Self::ArrayHandle> {
        op_reduce_sum(array, axes, keepdims)
    }

    fn argsort(
        &self,
        array: &Self::ArrayHandle,
        axis: usize,
        comparator: SortComparator,
        stable: bool,
    ) -> BackendResult<Self::ArrayHandle> {
        op_argsort(array, axis, comparator, stable)
    }

    fn take_along_axis(
        &self,
        array: &Self::ArrayHandle,
        indices: &Self::ArrayHandle,
        axis: usize,
    ) -> BackendResult<Self::ArrayHandle> {
        op_take_along_axis(array, indices, axis)
    }
}

fn literal_to_array(literal: &TensorLiteral) -> BackendResult<CpuArray> {
    match literal.spec.dtype {
        DType::F32 => {
            let data = bytes_to_f32(&literal.bytes)?;
            Ok(CpuArray {
                spec: literal.spec.clone(),
                data: ArrayData::F32(Arc::from(data)),
            })
        }
        DType::Si32 => {
            let data = bytes_to_i32(&literal.bytes)?;
            Ok(CpuArray {
                spec: literal.spec.clone(),
                data: ArrayData::Si32(Arc::from(data)),
            })
        }
        DType::I1 => {
            let data = literal.bytes.iter().cloned().collect::<Vec<u8>>();
            Ok(CpuArray {
                spec: literal.spec.clone(),
                data: ArrayData::Bool(Arc::from(data)),
            })
        }
    }
}

fn zeroed_array(spec: &TensorSpec) -> BackendResult<CpuArray> {
    let elem_count = spec.element_count();
    match spec.dtype {
        DType::F32 => Ok(CpuArray {
            spec: spec.clone(),
            data: ArrayData::F32(Arc::from(vec![0.0; elem_count])),
        }),
        DType::Si32 => Ok(CpuArray {
            spec: spec.clone(),
            data: ArrayData::Si32(Arc::from(vec![0; elem_count])),
        }),
        DType::I1 => Ok(CpuArray {
            spec: spec.clone(),
            data: ArrayData::Bool(Arc::from(vec![0; elem_count])),
        }),
    }
}

fn array_to_literal(array: &CpuArray) -> BackendResult<TensorLiteral> {
    match &array.data {
        ArrayData::F32(values) => Ok(TensorLiteral::new(
            array.spec.clone(),
            f32_to_bytes(values.as_ref()),
        )),
        ArrayData::Si32(values) => Ok(TensorLiteral::new(
            array.spec.clone(),
            i32_to_bytes(values.as_ref()),
        )),
        ArrayData::Bool(values) => Ok(TensorLiteral::new(array.spec.clone(), Arc::clone(values))),
    }
}

fn op_slice(array: &CpuArray, starts: &[usize], stops: &[usize]) -> BackendResult<CpuArray> {
    let dims = array.spec.shape.dims();
    if starts.len() != dims.len() || stops.len() != dims.len() {
        return Err(BackendError::execution("slice rank mismatch"));
    }
    let mut out_dims = Vec::with_capacity(dims.len());
    for axis in 0..dims.len() {
        if stops[axis] < starts[axis] || stops[axis] > dims[axis] {
            return Err(BackendError::execution("slice out of bounds"));
        }
        out_dims.push(stops[axis] - starts[axis]);
    }
    let spec = TensorSpec::new(array.spec.dtype, Shape::new(out_dims.clone()));
    match &array.data {
        ArrayData::F32(values) => Ok(CpuArray {
            spec,
            data: ArrayData::F32(Arc::from(copy_region(values, dims, starts, &out_dims)?)),
        }),
        ArrayData::Si32(values) => Ok(CpuArray {
            spec,
            data: ArrayData::Si32(Arc::from(copy_region(values, dims, starts, &out_dims)?)),
        }),
        ArrayData::Bool(values) => Ok(CpuArray {
            spec,
            data: ArrayData::Bool(Arc::from(copy_region(values, dims, starts, &out_dims)?)),
        }),
    }
}

fn copy_region<T: Copy>(
    values: &[T],
    dims: &[usize],
    starts: &[usize],
    out_dims: &[usize],
) -> BackendResult<Vec<T>> {
    let strides = compute_strides(dims);
    let mut result = Vec::with_capacity(out_dims.iter().product());
    for coord in IndexSpace::new(out_dims)?.iter() {
        let mut src = 0usize;
        for (axis, &component) in coord.iter().enumerate() {
            src += (starts[axis] + component) * strides[axis];
        }
        result.push(values[src]);
    }
    Ok(result)
}

fn op_slice_update(
    array: &CpuArray,
    patch: &CpuArray,
    starts: &[usize],
    stops: &[usize],
) -> BackendResult<CpuArray> {
    let dims = array.spec.shape.dims();
    let patch_dims = patch.spec.shape.dims();
    if starts.len() != dims.len() || stops.len() != dims.len() {
        return Err(BackendError::execution("slice_update rank mismatch"));
    }
    if array.spec.dtype != patch.spec.dtype {
        return Err(BackendError::execution(
            "slice_update dtype mismatch between base and patch",
        ));
    }
    let mut region = Vec::with_capacity(dims.len());
    for axis in 0..dims.len() {
        if stops[axis] < starts[axis] || stops[axis] > dims[axis] {
            return Err(BackendError::execution("slice_update out of bounds"));
        }
        region.push(stops[axis] - starts[axis]);
    }
    if patch_dims != region.as_slice() {
        return Err(BackendError::execution("slice_update patch shape mismatch"));
    }
    match (&array.data, &patch.data) {
        (ArrayData::F32(base), ArrayData::F32(values)) => Ok(CpuArray {
            spec: array.spec.clone(),
            data: ArrayData::F32(Arc::from(write_region(base, values, dims, starts, &region)?)),
        }),
        (ArrayData::Si32(base), ArrayData::Si32(values)) => Ok(CpuArray {
            spec: array.spec.clone(),
            data: ArrayData::Si32(Arc::from(write_region(base, values, dims, starts, &region)?)),
        }),
        (ArrayData::Bool(base), ArrayData::Bool(values)) => Ok(CpuArray {
            spec: array.spec.clone(),
            data: ArrayData::Bool(Arc::from(write_region(base, values, dims, starts, &region)?)),
        }),
        _ => Err(BackendError::execution(
            "slice_update storage mismatch between base and patch",
        )),
    }
}

fn write_region<T: Copy>(
    base: &[T],
    patch: &[T],
    dims: &[usize],
    starts: &[usize],
    region: &[usize],
) -> BackendResult<Vec<T>> {
    let strides = compute_strides(dims);
    let mut result = base.to_vec();
    for (flat, coord) in IndexSpace::new(region)?.iter().enumerate() {
        let mut dst = 0usize;
        for (axis, &component) in coord.iter().enumerate() {
            dst += (starts[axis] + component) * strides[axis];
        }
        result[dst] = patch[flat];
    }
    Ok(result)
}

fn op_reshape(array: &CpuArray, new_dims: &[usize]) -> BackendResult<CpuArray> {
    let old_count = array.spec.element_count();
    let new_count: usize = new_dims.iter().product();
    if old_count != new_count {
        return Err(BackendError::execution(format!(
            "reshape element count mismatch: {old_count} vs {new_count}"
        )));
    }
    Ok(CpuArray {
        spec: TensorSpec::new(array.spec.dtype, Shape::new(new_dims.to_vec())),
        data: array.data.clone(),
    })
}

fn op_gather(
    array: &CpuArray,
    indices: &[CpuArray],
    axes: &[usize],
    slice_sizes: &[usize],
) -> BackendResult<CpuArray> {
    let dims = array.spec.shape.dims();
    let rank = dims.len();
    if indices.len() != axes.len() {
        return Err(BackendError::execution(
            "gather expects one index array per listed axis",
        ));
    }
    for (pos, &axis) in axes.iter().enumerate() {
        if axis >= rank {
            return Err(BackendError::execution("gather axis out of range"));
        }
        if axes[..pos].contains(&axis) {
            return Err(BackendError::execution("gather axes must be unique"));
        }
    }
    if slice_sizes.len() != rank {
        return Err(BackendError::execution(
            "gather slice_sizes length must match array rank",
        ));
    }
    for (axis, (&size, &extent)) in slice_sizes.iter().zip(dims).enumerate() {
        if size > extent {
            return Err(BackendError::execution(format!(
                "gather slice size {size} exceeds extent {extent} on axis {axis}"
            )));
        }
    }
    let columns = index_columns(indices, "gather")?;
    let idx_dims = if indices.is_empty() {
        &[][..]
    } else {
        indices[0].spec.shape.dims()
    };

    let mut out_dims = idx_dims.to_vec();
    out_dims.extend_from_slice(slice_sizes);
    let spec = TensorSpec::new(array.spec.dtype, Shape::new(out_dims));
    match &array.data {
        ArrayData::F32(values) => Ok(CpuArray {
            spec,
            data: ArrayData::F32(Arc::from(gather_values(
                values,
                dims,
                idx_dims,
                &columns,
                axes,
                slice_sizes,
            )?)),
        }),
        ArrayData::Si32(values) => Ok(CpuArray {
            spec,
            data: ArrayData::Si32(Arc::from(gather_values(
                values,
                dims,
                idx_dims,
                &columns,
                axes,
                slice_sizes,
            )?)),
        }),
        ArrayData::Bool(_) => Err(BackendError::execution(
            "gather only supports f32 and si32 arrays",
        )),
    }
}

fn gather_values<T: Copy>(
    values: &[T],
    dims: &[usize],
    idx_dims: &[usize],
    columns: &[&[i32]],
    axes: &[usize],
    slice_sizes: &[usize],
) -> BackendResult<Vec<T>> {
    let strides = compute_strides(dims);
    let window = IndexSpace::new(slice_sizes)?;
    let idx_count: usize = idx_dims.iter().product();
    let mut result = Vec::with_capacity(idx_count * window.num_coordinates());
    for flat in 0..idx_count {
        let mut starts = vec![0usize; dims.len()];
        for (column, &axis) in columns.iter().zip(axes) {
            let value = column[flat];
            if value < 0 || value as usize + slice_sizes[axis] > dims[axis] {
                return Err(BackendError::execution("gather index out of bounds"));
            }
            starts[axis] = value as usize;
        }
        for coord in window.iter() {
            let mut src = 0usize;
            for (axis, &component) in coord.iter().enumerate() {
                src += (starts[axis] + component) * strides[axis];
            }
            result.push(values[src]);
        }
    }
    Ok(result)
}

fn op_scatter_add(
    array: &CpuArray,
    indices: &[CpuArray],
    updates: &CpuArray,
    axes: &[usize],
) -> BackendResult<CpuArray> {
    let dims = array.spec.shape.dims();
    let rank = dims.len();
    if indices.len() != axes.len() {
        return Err(BackendError::execution(
            "scatter_add expects one index array per listed axis",
        ));
    }
    for (pos, &axis) in axes.iter().enumerate() {
        if axis >= rank {
            return Err(BackendError::execution("scatter_add axis out of range"));
        }
        if axes[..pos].contains(&axis) {
            return Err(BackendError::execution("scatter_add axes must be unique"));
        }
    }
    if array.spec.dtype != updates.spec.dtype {
        return Err(BackendError::execution(
            "scatter_add dtype mismatch between array and updates",
        ));
    }
    let columns = index_columns(indices, "scatter_add")?;
    let idx_dims = if indices.is_empty() {
        &[][..]
    } else {
        indices[0].spec.shape.dims()
    };

    // Updates carry one window per index coordinate: their shape is the
    // index shape followed by a per-axis window extent.
    let update_dims = updates.spec.shape.dims();
    if update_dims.len() != idx_dims.len() + rank || &update_dims[..idx_dims.len()] != idx_dims {
        return Err(BackendError::execution(
            "scatter_add updates shape must be the index shape followed by window extents",
        ));
    }
    let window_dims = &update_dims[idx_dims.len()..];

    match (&array.data, &updates.data) {
        (ArrayData::F32(base), ArrayData::F32(values)) => Ok(CpuArray {
            spec: array.spec.clone(),
            data: ArrayData::F32(Arc::from(scatter_add_values(
                base,
                values,
                dims,
                idx_dims,
                window_dims,
                &columns,
                axes,
            )?)),
        }),
        (ArrayData::Si32(base), ArrayData::Si32(values)) => Ok(CpuArray {
            spec: array.spec.clone(),
            data: ArrayData::Si32(Arc::from(scatter_add_values(
                base,
                values,
                dims,
                idx_dims,
                window_dims,
                &columns,
                axes,
            )?)),
        }),
        _ => Err(BackendError::execution(
            "scatter_add only supports f32 and si32 arrays",
        )),
    }
}

fn scatter_add_values<T: Copy + AddAssign>(
    base: &[T],
    updates: &[T],
    dims: &[usize],
    idx_dims: &[usize],
    window_dims: &[usize],
    columns: &[&[i32]],
    axes: &[usize],
) -> BackendResult<Vec<T>> {
    let strides = compute_strides(dims);
    let window = IndexSpace::new(window_dims)?;
    let idx_count: usize = idx_dims.iter().product();
    let mut result = base.to_vec();
    let mut update_slot = 0usize;
    for flat in 0..idx_count {
        let mut starts = vec![0usize; dims.len()];
        for (column, &axis) in columns.iter().zip(axes) {
            let value = column[flat];
            if value < 0 || value as usize >= dims[axis] {
                return Err(BackendError::execution("scatter index out of bounds"));
            }
            starts[axis] = value as usize;
        }
        for coord in window.iter() {
            let mut dst = 0usize;
            for (axis, &component) in coord.iter().enumerate() {
                let position = starts[axis] + component;
                if position >= dims[axis] {
                    return Err(BackendError::execution("scatter window out of bounds"));
                }
                dst += position * strides[axis];
            }
            result[dst] += updates[update_slot];
            update_slot += 1;
        }
    }
    Ok(result)
}

fn op_compare(lhs: &CpuArray, rhs: &CpuArray, op: ComparisonOp) -> BackendResult<CpuArray> {
    if lhs.spec.shape != rhs.spec.shape {
        return Err(BackendError::execution("compare operands must match shape"));
    }
    let spec = TensorSpec::new(DType::I1, lhs.spec.shape.clone());
    match (&lhs.data, &rhs.data) {
        (ArrayData::F32(a), ArrayData::F32(b)) => Ok(CpuArray {
            spec,
            data: ArrayData::Bool(Arc::from(compare_values(a, b, op))),
        }),
        (ArrayData::Si32(a), ArrayData::Si32(b)) => Ok(CpuArray {
            spec,
            data: ArrayData::Bool(Arc::from(compare_values(a, b, op))),
        }),
        _ => Err(BackendError::execution(
            "compare only supports matching f32 or si32 operands",
        )),
    }
}

fn compare_values<T: Copy + PartialOrd>(a: &[T], b: &[T], op: ComparisonOp) -> Vec<u8> {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let hit = match op {
                ComparisonOp::Less => x < y,
                ComparisonOp::LessEqual => x <= y,
                ComparisonOp::Equal => x == y,
                ComparisonOp::GreaterEqual => x >= y,
                ComparisonOp::Greater => x > y,
                ComparisonOp::NotEqual => x != y,
            };
            u8::from(hit)
        })
        .collect()
}

fn op_binary(lhs: &CpuArray, rhs: &CpuArray, op: ElementwiseBinaryOp) -> BackendResult<CpuArray> {
    if lhs.spec.shape != rhs.spec.shape {
        return Err(BackendError::execution(
            "binary op operands must match shape",
        ));
    }
    match (&lhs.data, &rhs.data) {
        (ArrayData::F32(a), ArrayData::F32(b)) => {
            let values: Vec<f32> = a
                .iter()
                .zip(b.iter())
                .map(|(&x, &y)| match op {
                    ElementwiseBinaryOp::Add => x + y,
                    ElementwiseBinaryOp::Sub => x - y,
                    ElementwiseBinaryOp::Mul => x * y,
                    ElementwiseBinaryOp::Div => x / y,
                    ElementwiseBinaryOp::Maximum => x.max(y),
                    ElementwiseBinaryOp::Minimum => x.min(y),
                })
                .collect();
            Ok(CpuArray {
                spec: lhs.spec.clone(),
                data: ArrayData::F32(Arc::from(values)),
            })
        }
        (ArrayData::Si32(a), ArrayData::Si32(b)) => {
            if matches!(op, ElementwiseBinaryOp::Div) && b.iter().any(|&y| y == 0) {
                return Err(BackendError::execution("integer divide by zero"));
            }
            let values: Vec<i32> = a
                .iter()
                .zip(b.iter())
                .map(|(&x, &y)| match op {
                    ElementwiseBinaryOp::Add => x + y,
                    ElementwiseBinaryOp::Sub => x - y,
                    ElementwiseBinaryOp::Mul => x * y,
                    ElementwiseBinaryOp::Div => x / y,
                    ElementwiseBinaryOp::Maximum => x.max(y),
                    ElementwiseBinaryOp::Minimum => x.min(y),
                })
                .collect();
            Ok(CpuArray {
                spec: lhs.spec.clone(),
                data: ArrayData::Si32(Arc::from(values)),
            })
        }
        _ => Err(BackendError::execution(
            "binary ops only support matching f32 or si32 operands",
        )),
    }
}

fn op_reduce_sum(array: &CpuArray, axes: &[usize], keepdims: bool) -> BackendResult<CpuArray> {
    let dims = array.spec.shape.dims();
    let rank = dims.len();
    for (pos, &axis) in axes.iter().enumerate() {
        if axis >= rank {
            return Err(BackendError::execution("reduce_sum axis out of range"));
        }
        if axes[..pos].contains(&axis) {
            return Err(BackendError::execution("reduce_sum axes must be unique"));
        }
    }
    let mut out_dims = Vec::with_capacity(rank);
    for (axis, &extent) in dims.iter().enumerate() {
        if axes.contains(&axis) {
            if keepdims {
                out_dims.push(1);
            }
        } else {
            out_dims.push(extent);
        }
    }
    if out_dims.is_empty() {
        out_dims.push(1);
    }
    let out_strides = compute_strides(&out_dims);
    let out_len: usize = out_dims.iter().product();

    // Maps an input coordinate to its accumulator slot.
    let slot_of = |coord: &[usize]| -> usize {
        let mut slot = 0usize;
        let mut out_axis = 0usize;
        for (axis, &component) in coord.iter().enumerate() {
            if axes.contains(&axis) {
                if keepdims {
                    out_axis += 1;
                }
                continue;
            }
            slot += component * out_strides[out_axis];
            out_axis += 1;
        }
        slot
    };

    match &array.data {
        ArrayData::F32(values) => {
            let mut result = vec![0.0f32; out_len];
            for (flat, coord) in IndexSpace::new(dims)?.iter().enumerate() {
                result[slot_of(&coord)] += values[flat];
            }
            Ok(CpuArray {
                spec: TensorSpec::new(DType::F32, Shape::new(out_dims)),
                data: ArrayData::F32(Arc::from(result)),
            })
        }
        ArrayData::Si32(values) => {
            let mut result = vec![0i32; out_len];
            for (flat, coord) in IndexSpace::new(dims)?.iter().enumerate() {
                result[slot_of(&coord)] += values[flat];
            }
            Ok(CpuArray {
                spec: TensorSpec::new(DType::Si32, Shape::new(out_dims)),
                data: ArrayData::Si32(Arc::from(result)),
            })
        }
        ArrayData::Bool(values) => {
            // Booleans sum into si32 counts.
            let mut result = vec![0i32; out_len];
            for (flat, coord) in IndexSpace::new(dims)?.iter().enumerate() {
                result[slot_of(&coord)] += i32::from(values[flat]);
            }
            Ok(CpuArray {
                spec: TensorSpec::new(DType::Si32, Shape::new(out_dims)),
                data: ArrayData::Si32(Arc::from(result)),
            })
        }
    }
}

fn op_argsort(
    array: &CpuArray,
    axis: usize,
    comparator: SortComparator,
    stable: bool,
) -> BackendResult<CpuArray> {
    let dims = array.spec.shape.dims();
    if axis >= dims.len() {
        return Err(BackendError::execution("argsort axis out of range"));
    }
    let spec = TensorSpec::new(DType::Si32, array.spec.shape.clone());
    match &array.data {
        ArrayData::F32(values) => {
            let order = argsort_lanes(
                values,
                dims,
                axis,
                |a: &f32, b: &f32| match comparator {
                    SortComparator::LessThan => a.total_cmp(b),
                    SortComparator::GreaterThan => b.total_cmp(a),
                },
                stable,
            )?;
            Ok(CpuArray {
                spec,
                data: ArrayData::Si32(Arc::from(order)),
            })
        }
        ArrayData::Si32(values) => {
            let order = argsort_lanes(
                values,
                dims,
                axis,
                |a: &i32, b: &i32| match comparator {
                    SortComparator::LessThan => a.cmp(b),
                    SortComparator::GreaterThan => b.cmp(a),
                },
                stable,
            )?;
            Ok(CpuArray {
                spec,
                data: ArrayData::Si32(Arc::from(order)),
            })
        }
        ArrayData::Bool(_) => Err(BackendError::execution(
            "argsort only supports f32 and si32 arrays",
        )),
    }
}

fn argsort_lanes<T: Copy>(
    values: &[T],
    dims: &[usize],
    axis: usize,
    mut cmp: impl FnMut(&T, &T) -> Ordering,
    stable: bool,
) -> BackendResult<Vec<i32>> {
    let strides = compute_strides(dims);
    let lane_len = dims[axis];
    let mut lane_dims = dims.to_vec();
    lane_dims[axis] = 1;
    let mut result = vec![0i32; values.len()];
    for lane in IndexSpace::new(&lane_dims)?.iter() {
        let mut base = 0usize;
        for (d, &component) in lane.iter().enumerate() {
            base += component * strides[d];
        }
        let mut order: Vec<usize> = (0..lane_len).collect();
        let key = |&position: &usize| values[base + position * strides[axis]];
        if stable {
            order.sort_by(|a, b| cmp(&key(a), &key(b)));
        } else {
            order.sort_unstable_by(|a, b| cmp(&key(a), &key(b)));
        }
        for (sorted_position, &original) in order.iter().enumerate() {
            result[base + sorted_position * strides[axis]] = original as i32;
        }
    }
    Ok(result)
}

fn op_take_along_axis(
    array: &CpuArray,
    indices: &CpuArray,
    axis: usize,
) -> BackendResult<CpuArray> {
    let dims = array.spec.shape.dims();
    let idx_dims = indices.spec.shape.dims();
    if axis >= dims.len() {
        return Err(BackendError::execution("take_along_axis axis out of range"));
    }
    if idx_dims.len() != dims.len() {
        return Err(BackendError::execution(
            "take_along_axis requires indices to have the same rank as the array",
        ));
    }
    for (d, (&extent, &idx_extent)) in dims.iter().zip(idx_dims).enumerate() {
        if d != axis && extent != idx_extent {
            return Err(BackendError::execution("take_along_axis shape mismatch"));
        }
    }
    let index_values = match &indices.data {
        ArrayData::Si32(values) => values.as_ref(),
        _ => {
            return Err(BackendError::execution(
                "take_along_axis indices must be si32",
            ))
        }
    };
    let spec = TensorSpec::new(array.spec.dtype, indices.spec.shape.clone());
    match &array.data {
        ArrayData::F32(values) => Ok(CpuArray {
            spec,
            data: ArrayData::F32(Arc::from(take_values(
                values,
                dims,
                idx_dims,
                index_values,
                axis,
            )?)),
        }),
        ArrayData::Si32(values) => Ok(CpuArray {
            spec,
            data: ArrayData::Si32(Arc::from(take_values(
                values,
                dims,
                idx_dims,
                index_values,
                axis,
            )?)),
        }),
        ArrayData::Bool(_) => Err(BackendError::execution(
            "take_along_axis only supports f32 and si32 arrays",
        )),
    }
}

fn take_values<T: Copy>(
    values: &[T],
    dims: &[usize],
    idx_dims: &[usize],
    index_values: &[i32],
    axis: usize,
) -> BackendResult<Vec<T>> {
    let strides = compute_strides(dims);
    let mut result = Vec::with_capacity(index_values.len());
    for (flat, coord) in IndexSpace::new(idx_dims)?.iter().enumerate() {
        let index = index_values[flat];
        if index < 0 || index as usize >= dims[axis] {
            return Err(BackendError::execution("take_along_axis index out of bounds"));
        }
        let mut src = 0usize;
        for (d, &component) in coord.iter().enumerate() {
            let component = if d == axis { index as usize } else { component };
            src += component * strides[d];
        }
        result.push(values[src]);
    }
    Ok(result)
}

fn index_columns<'a>(indices: &'a [CpuArray], op: &'static str) -> BackendResult<Vec<&'a [i32]>> {
    let mut columns = Vec::with_capacity(indices.len());
    for index in indices {
        if !indices.is_empty() && index.spec.shape != indices[0].spec.shape {
            return Err(BackendError::execution(format!(
                "{op} index arrays must share one shape"
            )));
        }
        match &index.data {
            ArrayData::Si32(values) => columns.push(values.as_ref()),
            _ => {
                return Err(BackendError::spec(
                    SpecErrorCode::DTypeNotSupported,
                    format!("{op} index arrays must be si32"),
                ))
            }
        }
    }
    Ok(columns)
}

fn compute_strides(dims: &[usize]) -> Vec<usize> {
    let mut strides = vec![0; dims.len()];
    let mut acc = 1usize;
    for (i, dim) in dims.iter().enumerate().rev() {
        strides[i] = acc;
        acc *= *dim;
    }
    strides
}

fn bytes_to_f32(bytes: &[u8]) -> BackendResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(BackendError::execution(
            "literal byte length mismatches f32",
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

fn bytes_to_i32(bytes: &[u8]) -> BackendResult<Vec<i32>> {
    if bytes.len() % 4 != 0 {
        return Err(BackendError::execution(
            "literal byte length mismatches i32",
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

fn f32_to_bytes(values: &[f32]) -> Arc<[u8]> {
    let mut bytes = Vec::with_capacity(values.len() * 4);
    for &value in values {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    Arc::from(bytes.into_boxed_slice())
}

fn i32_to_bytes(values: &[i32]) -> Arc<[u8]> {
    let mut bytes = Vec::with_capacity(values.len() * 4);
    for &value in values {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    Arc::from(bytes.into_boxed_slice())
}
