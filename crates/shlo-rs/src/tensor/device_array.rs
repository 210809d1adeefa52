//! Backend-resident array paired with its frontend metadata.

use std::sync::Arc;

use anyhow::{Context, Result};

use super::{spec_utils, DType, Shape, Tensor};
use crate::backend::spec::{ArrayBackend, TensorInit, TensorSpec};

/// Array owned by a backend, never mutated in place: every operation
/// derives a new `DeviceArray` from its inputs.
pub struct DeviceArray<B: ArrayBackend> {
    backend: Arc<B>,
    shape: Shape,
    dtype: DType,
    handle: B::ArrayHandle,
}

impl<B: ArrayBackend> Clone for DeviceArray<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            shape: self.shape.clone(),
            dtype: self.dtype,
            handle: self.handle.clone(),
        }
    }
}

impl<B: ArrayBackend> DeviceArray<B> {
    /// Materialises a host tensor on the given backend.
    pub fn from_host(backend: Arc<B>, host: &Tensor) -> Result<Self> {
        let shape = host.shape().clone();
        let dtype = host.dtype();
        let handle = backend
            .materialize(TensorInit::Literal(host.to_literal()))
            .context("failed to materialize host tensor")?;
        Ok(Self {
            backend,
            shape,
            dtype,
            handle,
        })
    }

    /// Allocates a zero-initialized array of the requested shape and dtype.
    pub fn zeros(backend: Arc<B>, shape: Shape, dtype: DType) -> Result<Self> {
        let spec = TensorSpec::new(
            spec_utils::backend_dtype(dtype),
            spec_utils::backend_shape_from_shape(&shape),
        );
        let handle = backend
            .materialize(TensorInit::Zeroed(spec))
            .context("failed to materialize zeroed array")?;
        Ok(Self {
            backend,
            shape,
            dtype,
            handle,
        })
    }

    /// Wraps an existing backend handle with frontend metadata.
    pub fn from_handle(backend: Arc<B>, shape: Shape, dtype: DType, handle: B::ArrayHandle) -> Self {
        Self {
            backend,
            shape,
            dtype,
            handle,
        }
    }

    /// Reads the array back into a host tensor.
    pub fn to_host(&self) -> Result<Tensor> {
        let literal = self
            .backend
            .to_literal(&self.handle)
            .context("failed to read array back to host")?;
        Tensor::from_literal(&literal)
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn handle(&self) -> &B::ArrayHandle {
        &self.handle
    }

    pub fn backend(&self) -> Arc<B> {
        Arc::clone(&self.backend)
    }
}
