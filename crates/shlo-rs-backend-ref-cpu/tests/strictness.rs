//! Bounds policy lives in the resolvers; the backend itself is strict.

use std::sync::Arc;

use shlo_rs::backend::spec::{ArrayBackend, TensorInit};
use shlo_rs::{Shape, Tensor};
use shlo_rs_backend_ref_cpu::CpuBackend;

fn materialize(backend: &CpuBackend, tensor: Tensor) -> <CpuBackend as ArrayBackend>::ArrayHandle {
    backend
        .materialize(TensorInit::Literal(tensor.to_literal()))
        .unwrap()
}

#[test]
fn gather_rejects_out_of_bounds_indices() {
    let backend = Arc::new(CpuBackend::new());
    let data = materialize(&backend, Tensor::from_i32(Shape::new([3]), vec![1, 2, 3]).unwrap());
    let indices = materialize(&backend, Tensor::from_i32(Shape::new([1]), vec![3]).unwrap());
    let result = backend.gather(&data, &[indices], &[0], &[1]);
    assert!(result.is_err());
}

#[test]
fn scatter_add_rejects_out_of_bounds_indices() {
    let backend = Arc::new(CpuBackend::new());
    let data = materialize(&backend, Tensor::from_i32(Shape::new([3]), vec![1, 2, 3]).unwrap());
    let indices = materialize(&backend, Tensor::from_i32(Shape::new([1]), vec![-1]).unwrap());
    let updates = materialize(&backend, Tensor::from_i32(Shape::new([1, 1]), vec![5]).unwrap());
    let result = backend.scatter_add(&data, &[indices], &updates, &[0]);
    assert!(result.is_err());
}

#[test]
fn slice_rejects_out_of_bounds_region() {
    let backend = Arc::new(CpuBackend::new());
    let data = materialize(&backend, Tensor::from_i32(Shape::new([2, 2]), vec![1, 2, 3, 4]).unwrap());
    assert!(backend.slice(&data, &[0, 1], &[2, 3]).is_err());
    assert!(backend.slice(&data, &[1, 1], &[0, 2]).is_err());
}
