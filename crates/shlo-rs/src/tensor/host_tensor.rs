//! Host-backed tensor used for literals, fixtures, and readback.

use std::mem::{size_of, ManuallyDrop};
use std::sync::Arc;

use anyhow::{bail, ensure, Result};
use rand::Rng;

use super::{dtype::DType, shape::Shape, spec_utils};
use crate::backend::spec::{TensorLiteral, TensorSpec};

/// Simple host-backed tensor holding a dense row-major payload.
#[derive(Debug, Clone)]
pub struct Tensor {
    shape: Shape,
    dtype: DType,
    data: Vec<u8>,
}

impl Tensor {
    /// Constructs an `F32` tensor from raw values, validating the length against the shape.
    pub fn from_vec(shape: Shape, data: Vec<f32>) -> Result<Self> {
        if data.len() != shape.num_elements() {
            bail!(
                "tensor data length ({}) does not match shape {:?}",
                data.len(),
                shape.dims()
            );
        }
        Ok(Tensor {
            shape,
            dtype: DType::F32,
            data: vec_into_bytes(data),
        })
    }

    /// Constructs an `I32` tensor, ensuring the payload matches the expected element count.
    pub fn from_i32(shape: Shape, data: Vec<i32>) -> Result<Self> {
        if data.len() != shape.num_elements() {
            bail!(
                "tensor data length ({}) does not match shape {:?}",
                data.len(),
                shape.dims()
            );
        }
        Ok(Tensor {
            shape,
            dtype: DType::I32,
            data: vec_into_bytes(data),
        })
    }

    /// Returns a zero-initialized `F32` tensor of the requested shape.
    pub fn zeros(shape: Shape) -> Self {
        let len = shape.num_elements();
        Tensor {
            shape,
            dtype: DType::F32,
            data: vec_into_bytes(vec![0.0f32; len]),
        }
    }

    /// Returns a zero-initialized `I32` tensor of the requested shape.
    pub fn zeros_i32(shape: Shape) -> Self {
        let len = shape.num_elements();
        Tensor {
            shape,
            dtype: DType::I32,
            data: vec_into_bytes(vec![0i32; len]),
        }
    }

    /// Returns an `I32` tensor with every element set to `value`.
    pub fn full_i32(shape: Shape, value: i32) -> Self {
        let len = shape.num_elements();
        Tensor {
            shape,
            dtype: DType::I32,
            data: vec_into_bytes(vec![value; len]),
        }
    }

    /// Returns an `I32` tensor filled with `start, start + 1, ...` in row-major order.
    pub fn iota_i32(shape: Shape, start: i32) -> Self {
        let len = shape.num_elements();
        let values: Vec<i32> = (0..len as i32).map(|i| start + i).collect();
        Tensor {
            shape,
            dtype: DType::I32,
            data: vec_into_bytes(values),
        }
    }

    /// Samples from a normal distribution (`N(0, std^2)`) using the Box-Muller transform.
    pub fn randn(shape: Shape, std: f32, rng: &mut impl Rng) -> Self {
        let len = shape.num_elements();
        let mut values = Vec::with_capacity(len);
        while values.len() < len {
            let u1: f32 = rng.gen::<f32>().max(f32::MIN_POSITIVE);
            let u2: f32 = rng.gen::<f32>();
            let r = (-2.0 * u1.ln()).sqrt();
            let theta = 2.0 * std::f32::consts::PI * u2;
            let z0 = r * theta.cos() * std;
            let z1 = r * theta.sin() * std;
            values.push(z0);
            if values.len() < len {
                values.push(z1);
            }
        }
        Tensor {
            shape,
            dtype: DType::F32,
            data: vec_into_bytes(values),
        }
    }

    /// Returns the total number of elements stored in the tensor.
    pub fn len(&self) -> usize {
        self.shape.num_elements()
    }

    /// Reports whether the tensor contains zero elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Provides access to the tensor shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the scalar dtype of the tensor payload.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Borrows the underlying `f32` data slice, panicking if the dtype differs.
    pub fn data(&self) -> &[f32] {
        match self.dtype {
            DType::F32 => bytes_as_slice::<f32>(&self.data),
            _ => panic!("tensor data is not stored as f32"),
        }
    }

    /// Borrows the underlying `i32` data slice, panicking if the dtype differs.
    pub fn data_i32(&self) -> &[i32] {
        match self.dtype {
            DType::I32 => bytes_as_slice::<i32>(&self.data),
            _ => panic!("tensor data is not stored as i32"),
        }
    }

    /// Reads the `i32` element at a full coordinate.
    pub fn i32_at(&self, coord: &[usize]) -> i32 {
        self.data_i32()[self.flat_index(coord)]
    }

    /// Reads the `f32` element at a full coordinate.
    pub fn f32_at(&self, coord: &[usize]) -> f32 {
        self.data()[self.flat_index(coord)]
    }

    fn flat_index(&self, coord: &[usize]) -> usize {
        assert_eq!(
            coord.len(),
            self.shape.rank(),
            "coordinate rank {} does not match tensor rank {}",
            coord.len(),
            self.shape.rank()
        );
        let strides = self.shape.row_major_strides();
        coord
            .iter()
            .zip(strides.iter())
            .map(|(c, s)| c * s)
            .sum()
    }

    /// Wraps the tensor in a backend-neutral literal for materialisation.
    pub fn to_literal(&self) -> TensorLiteral {
        let spec = TensorSpec::new(
            spec_utils::backend_dtype(self.dtype),
            spec_utils::backend_shape_from_shape(&self.shape),
        );
        TensorLiteral::new(spec, Arc::from(self.data.clone().into_boxed_slice()))
    }

    /// Reconstructs a host tensor from a backend literal.
    pub fn from_literal(literal: &TensorLiteral) -> Result<Self> {
        let dtype = spec_utils::frontend_dtype(literal.spec.dtype)?;
        let shape = spec_utils::shape_from_spec(&literal.spec);
        let expected_bytes = shape.num_elements() * dtype.size_in_bytes();
        ensure!(
            literal.bytes.len() == expected_bytes,
            "literal byte length {} does not match expected {}",
            literal.bytes.len(),
            expected_bytes
        );
        Ok(Tensor {
            shape,
            dtype,
            data: literal.bytes.as_ref().to_vec(),
        })
    }
}

/// Converts an owned vector into a raw byte buffer without copying.
fn vec_into_bytes<T>(data: Vec<T>) -> Vec<u8> {
    let mut data = ManuallyDrop::new(data);
    let ptr = data.as_mut_ptr() as *mut u8;
    let len = data.len() * size_of::<T>();
    let cap = data.capacity() * size_of::<T>();
    unsafe { Vec::from_raw_parts(ptr, len, cap) }
}

/// Views a byte slice as a typed slice, asserting that the layout matches.
fn bytes_as_slice<T>(bytes: &[u8]) -> &[T] {
    assert_eq!(
        bytes.len() % size_of::<T>(),
        0,
        "byte length {} is not a multiple of element size {}",
        bytes.len(),
        size_of::<T>()
    );
    unsafe { std::slice::from_raw_parts(bytes.as_ptr() as *const T, bytes.len() / size_of::<T>()) }
}
