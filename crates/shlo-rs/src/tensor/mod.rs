mod device_array;
mod dtype;
mod host_tensor;
mod shape;
pub mod spec_utils;

pub use device_array::DeviceArray;
pub use dtype::DType;
pub use host_tensor::Tensor;
pub use shape::Shape;
