//! Demo drivers replaying the worked gather/scatter/sort fixtures against
//! the reference CPU backend.

mod env;

use std::sync::Arc;

use anyhow::{bail, Result};
use shlo_rs::backend::spec::SortComparator;
use shlo_rs::ops::{self, GatherDimensionNumbers, ScatterDimensionNumbers};
use shlo_rs::{ArrayBackend, DeviceArray, Shape, Tensor};
use shlo_rs_backend_ref_cpu::CpuBackend;

fn main() -> Result<()> {
    let backend = Arc::new(CpuBackend::new());
    let mode = std::env::args().nth(1).unwrap_or_else(|| "gather".into());
    match mode.as_str() {
        "gather" => demo_gather(&backend),
        "scatter" => demo_scatter(&backend),
        "sort" => demo_sort(&backend),
        other => bail!("unknown demo '{other}', expected gather, scatter, or sort"),
    }
}

fn operand(backend: &Arc<CpuBackend>) -> Result<DeviceArray<CpuBackend>> {
    DeviceArray::from_host(
        Arc::clone(backend),
        &Tensor::iota_i32(Shape::new([2, 3, 4, 2]), 1),
    )
}

fn index_array(backend: &Arc<CpuBackend>) -> Result<DeviceArray<CpuBackend>> {
    DeviceArray::from_host(
        Arc::clone(backend),
        &Tensor::from_i32(
            Shape::new([2, 2, 3, 2]),
            vec![
                0, 0, 1, 0, 2, 1, 0, 1, 1, 1, 0, 9, //
                0, 0, 2, 1, 2, 2, 1, 2, 0, 1, 1, 0,
            ],
        )?,
    )
}

fn demo_gather(backend: &Arc<CpuBackend>) -> Result<()> {
    let dims = GatherDimensionNumbers {
        offset_dims: vec![3, 4],
        collapsed_slice_dims: vec![1],
        operand_batching_dims: vec![0],
        start_indices_batching_dims: vec![1],
        start_index_map: vec![2, 1],
        index_vector_dim: 3,
        slice_sizes: vec![1, 1, 2, 2],
    };
    let result = ops::gather(
        &operand(backend)?,
        &index_array(backend)?,
        &dims,
        &Shape::new([2, 2, 3, 2, 2]),
    )?;
    backend.eval(&[result.handle().clone()])?;
    print_array("gather", &result.to_host()?)
}

fn demo_scatter(backend: &Arc<CpuBackend>) -> Result<()> {
    let dims = ScatterDimensionNumbers {
        update_window_dims: vec![3, 4],
        inserted_window_dims: vec![1],
        input_batching_dims: vec![0],
        scatter_indices_batching_dims: vec![1],
        scatter_dims_to_operand_dims: vec![2, 1],
        index_vector_dim: 3,
    };
    let updates = DeviceArray::from_host(
        Arc::clone(backend),
        &Tensor::full_i32(Shape::new([2, 2, 3, 2, 2]), 1),
    )?;
    let results = ops::scatter(
        &[operand(backend)?],
        &index_array(backend)?,
        &[updates],
        &dims,
        &Shape::new([2, 3, 4, 2]),
    )?;
    let handles: Vec<_> = results.iter().map(|r| r.handle().clone()).collect();
    backend.eval(&handles)?;
    for result in &results {
        print_array("scatter", &result.to_host()?)?;
    }
    Ok(())
}

fn demo_sort(backend: &Arc<CpuBackend>) -> Result<()> {
    let keys = DeviceArray::from_host(
        Arc::clone(backend),
        &Tensor::from_i32(Shape::new([2, 3]), vec![1, 2, 3, 3, 2, 1])?,
    )?;
    let payload = DeviceArray::from_host(
        Arc::clone(backend),
        &Tensor::from_i32(Shape::new([2, 3]), vec![3, 2, 1, 1, 2, 3])?,
    )?;
    let results = ops::sort(&[keys, payload], 0, true, SortComparator::GreaterThan)?;
    let handles: Vec<_> = results.iter().map(|r| r.handle().clone()).collect();
    backend.eval(&handles)?;
    for (slot, result) in results.iter().enumerate() {
        print_array(&format!("sort[{slot}]"), &result.to_host()?)?;
    }
    Ok(())
}

fn print_array(name: &str, tensor: &Tensor) -> Result<()> {
    let dims = tensor.shape().dims();
    let values = tensor.data_i32();
    if env::dump_json_enabled() {
        let payload = serde_json::json!({
            "name": name,
            "dims": dims,
            "values": values,
        });
        println!("{payload}");
        return Ok(());
    }
    println!("{name} {dims:?}");
    let row = dims.last().copied().unwrap_or(1).max(1);
    for chunk in values.chunks(row) {
        println!("  {chunk:?}");
    }
    Ok(())
}
