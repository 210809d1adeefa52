//! Shared helpers for converting tensor metadata to backend specifications.

use anyhow::{bail, Result};

use crate::backend::spec::{DType as BackendDType, Shape as BackendShape, TensorSpec};
use crate::tensor::{DType as TensorDType, Shape as TensorShape};

/// Converts a frontend [`TensorShape`] into the backend shape representation.
pub fn backend_shape_from_shape(shape: &TensorShape) -> BackendShape {
    BackendShape::new(shape.dims().to_vec())
}

/// Maps a frontend tensor dtype into the backend equivalent.
pub fn backend_dtype(dtype: TensorDType) -> BackendDType {
    match dtype {
        TensorDType::F32 => BackendDType::F32,
        TensorDType::I32 => BackendDType::Si32,
    }
}

/// Maps a backend dtype into the frontend variant, rejecting unsupported types.
pub fn frontend_dtype(dtype: BackendDType) -> Result<TensorDType> {
    match dtype {
        BackendDType::F32 => Ok(TensorDType::F32),
        BackendDType::Si32 => Ok(TensorDType::I32),
        other => bail!(
            "backend dtype {:?} is not supported in portable frontend",
            other
        ),
    }
}

/// Extracts a frontend [`TensorShape`] from a backend tensor specification.
pub fn shape_from_spec(spec: &TensorSpec) -> TensorShape {
    TensorShape::new(spec.shape.dims().to_vec())
}
