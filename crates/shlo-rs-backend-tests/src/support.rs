//! Small helpers shared by the conformance suites.

use std::sync::Arc;

use shlo_rs::{ArrayBackend, DeviceArray, Tensor};

/// Materialises a host tensor on the backend under test.
pub fn device<B: ArrayBackend + 'static>(backend: &Arc<B>, host: Tensor) -> DeviceArray<B> {
    DeviceArray::from_host(Arc::clone(backend), &host).expect("materialize host tensor")
}

/// Reads an array back as `i32` values.
pub fn readback_i32<B: ArrayBackend + 'static>(array: &DeviceArray<B>) -> Vec<i32> {
    array
        .to_host()
        .expect("read array back to host")
        .data_i32()
        .to_vec()
}

/// Reads an array back as `f32` values.
pub fn readback_f32<B: ArrayBackend + 'static>(array: &DeviceArray<B>) -> Vec<f32> {
    array
        .to_host()
        .expect("read array back to host")
        .data()
        .to_vec()
}
