pub mod cpu;

pub use cpu::{ArrayData, CpuArray, CpuBackend};
