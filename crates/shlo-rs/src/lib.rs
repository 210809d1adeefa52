pub mod backend;
pub mod ops;
pub mod tensor;

pub use backend::spec::ArrayBackend;
pub use tensor::{DType, DeviceArray, Shape, Tensor};
