//! Conformance checks for the primitive operation vocabulary.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use shlo_rs::backend::spec::{ComparisonOp, ElementwiseBinaryOp, SortComparator};
use shlo_rs::{ArrayBackend, DeviceArray, Shape, Tensor};

use crate::support::{device, readback_f32, readback_i32};

pub fn materialize_round_trips_host_payloads<B: ArrayBackend + 'static>(backend: &Arc<B>) {
    let mut rng = StdRng::seed_from_u64(17);
    let host = Tensor::randn(Shape::new([3, 4]), 1.0, &mut rng);
    let array = device(backend, host.clone());
    assert_eq!(readback_f32(&array), host.data());
}

pub fn slice_copies_bounded_region<B: ArrayBackend + 'static>(backend: &Arc<B>) {
    let array = device(
        backend,
        Tensor::from_i32(Shape::new([2, 3]), vec![1, 2, 3, 4, 5, 6]).unwrap(),
    );
    let sliced = backend.slice(array.handle(), &[0, 1], &[2, 3]).unwrap();
    let host = backend.to_literal(&sliced).unwrap();
    let host = Tensor::from_literal(&host).unwrap();
    assert_eq!(host.shape().dims(), &[2, 2]);
    assert_eq!(host.data_i32(), &[2, 3, 5, 6]);
}

pub fn slice_update_derives_new_array<B: ArrayBackend + 'static>(backend: &Arc<B>) {
    let base = DeviceArray::zeros(
        Arc::clone(backend),
        Shape::new([2, 3]),
        shlo_rs::DType::I32,
    )
    .unwrap();
    let patch = device(
        backend,
        Tensor::from_i32(Shape::new([2, 2]), vec![1, 2, 3, 4]).unwrap(),
    );
    let updated = backend
        .slice_update(base.handle(), patch.handle(), &[0, 1], &[2, 3])
        .unwrap();
    let updated = Tensor::from_literal(&backend.to_literal(&updated).unwrap()).unwrap();
    assert_eq!(updated.data_i32(), &[0, 1, 2, 0, 3, 4]);
    // The base array derives, it does not mutate.
    assert_eq!(readback_i32(&base), vec![0; 6]);
}

pub fn reshape_preserves_row_major_order<B: ArrayBackend + 'static>(backend: &Arc<B>) {
    let array = device(
        backend,
        Tensor::from_i32(Shape::new([2, 3]), vec![1, 2, 3, 4, 5, 6]).unwrap(),
    );
    let reshaped = backend.reshape(array.handle(), &[3, 2]).unwrap();
    let host = Tensor::from_literal(&backend.to_literal(&reshaped).unwrap()).unwrap();
    assert_eq!(host.shape().dims(), &[3, 2]);
    assert_eq!(host.data_i32(), &[1, 2, 3, 4, 5, 6]);
}

pub fn compare_counts_matches_via_reduce_sum<B: ArrayBackend + 'static>(backend: &Arc<B>) {
    let lhs = device(
        backend,
        Tensor::from_i32(Shape::new([3]), vec![1, 5, 3]).unwrap(),
    );
    let rhs = device(
        backend,
        Tensor::from_i32(Shape::new([3]), vec![2, 2, 2]).unwrap(),
    );
    let mask = backend
        .compare(lhs.handle(), rhs.handle(), ComparisonOp::Greater)
        .unwrap();
    let count = backend.reduce_sum(&mask, &[0], false).unwrap();
    let count = Tensor::from_literal(&backend.to_literal(&count).unwrap()).unwrap();
    assert_eq!(count.data_i32(), &[2]);
}

pub fn binary_elementwise_arithmetic<B: ArrayBackend + 'static>(backend: &Arc<B>) {
    let lhs = device(
        backend,
        Tensor::from_vec(Shape::new([4]), vec![1.0, 2.0, 3.0, 4.0]).unwrap(),
    );
    let rhs = device(
        backend,
        Tensor::from_vec(Shape::new([4]), vec![4.0, 3.0, 2.0, 1.0]).unwrap(),
    );
    let sum = backend
        .binary(lhs.handle(), rhs.handle(), ElementwiseBinaryOp::Add)
        .unwrap();
    let sum = Tensor::from_literal(&backend.to_literal(&sum).unwrap()).unwrap();
    assert_eq!(sum.data(), &[5.0, 5.0, 5.0, 5.0]);
    let max = backend
        .binary(lhs.handle(), rhs.handle(), ElementwiseBinaryOp::Maximum)
        .unwrap();
    let max = Tensor::from_literal(&backend.to_literal(&max).unwrap()).unwrap();
    assert_eq!(max.data(), &[4.0, 3.0, 3.0, 4.0]);
}

pub fn reduce_sum_over_axis_keepdims<B: ArrayBackend + 'static>(backend: &Arc<B>) {
    let array = device(
        backend,
        Tensor::from_i32(Shape::new([2, 3]), vec![1, 2, 3, 4, 5, 6]).unwrap(),
    );
    let summed = backend.reduce_sum(array.handle(), &[1], true).unwrap();
    let summed = Tensor::from_literal(&backend.to_literal(&summed).unwrap()).unwrap();
    assert_eq!(summed.shape().dims(), &[2, 1]);
    assert_eq!(summed.data_i32(), &[6, 15]);
}

pub fn gather_reads_batched_windows<B: ArrayBackend + 'static>(backend: &Arc<B>) {
    let data = device(
        backend,
        Tensor::from_i32(Shape::new([3, 2]), vec![1, 2, 3, 4, 5, 6]).unwrap(),
    );
    let rows = device(
        backend,
        Tensor::from_i32(Shape::new([2]), vec![2, 0]).unwrap(),
    );
    let picked = backend
        .gather(data.handle(), &[rows.handle().clone()], &[0], &[1, 2])
        .unwrap();
    let picked = Tensor::from_literal(&backend.to_literal(&picked).unwrap()).unwrap();
    assert_eq!(picked.shape().dims(), &[2, 1, 2]);
    assert_eq!(picked.data_i32(), &[5, 6, 1, 2]);
}

pub fn scatter_add_accumulates_duplicate_targets<B: ArrayBackend + 'static>(backend: &Arc<B>) {
    let base = DeviceArray::zeros(Arc::clone(backend), Shape::new([3]), shlo_rs::DType::I32)
        .unwrap();
    let targets = device(
        backend,
        Tensor::from_i32(Shape::new([4]), vec![0, 1, 1, 2]).unwrap(),
    );
    let updates = device(
        backend,
        Tensor::from_i32(Shape::new([4, 1]), vec![1, 1, 1, 1]).unwrap(),
    );
    let result = backend
        .scatter_add(
            base.handle(),
            &[targets.handle().clone()],
            updates.handle(),
            &[0],
        )
        .unwrap();
    let result = Tensor::from_literal(&backend.to_literal(&result).unwrap()).unwrap();
    assert_eq!(result.data_i32(), &[1, 2, 1]);
}

pub fn argsort_descending_is_stable<B: ArrayBackend + 'static>(backend: &Arc<B>) {
    let keys = device(
        backend,
        Tensor::from_i32(Shape::new([4]), vec![3, 1, 3, 2]).unwrap(),
    );
    let order = backend
        .argsort(keys.handle(), 0, SortComparator::GreaterThan, true)
        .unwrap();
    let order = Tensor::from_literal(&backend.to_literal(&order).unwrap()).unwrap();
    assert_eq!(order.data_i32(), &[0, 2, 3, 1]);
}

pub fn take_along_axis_reorders_lanes<B: ArrayBackend + 'static>(backend: &Arc<B>) {
    let data = device(
        backend,
        Tensor::from_vec(Shape::new([2, 3]), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap(),
    );
    let order = device(
        backend,
        Tensor::from_i32(Shape::new([2, 3]), vec![2, 1, 0, 0, 2, 1]).unwrap(),
    );
    let taken = backend
        .take_along_axis(data.handle(), order.handle(), 1)
        .unwrap();
    backend.eval(&[taken.clone()]).unwrap();
    let taken = Tensor::from_literal(&backend.to_literal(&taken).unwrap()).unwrap();
    assert_eq!(taken.data(), &[3.0, 2.0, 1.0, 4.0, 6.0, 5.0]);
}
