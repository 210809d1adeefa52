pub mod fixtures;
pub mod gather;
pub mod primitives;
pub mod scatter;
pub mod sort;
pub mod support;

/// Instantiates the full conformance suite against one backend
/// constructor. Backends invoke this from their own `tests/` directory.
#[macro_export]
macro_rules! define_backend_tests {
    ($module:ident, $backend_ctor:expr) => {
        mod $module {
            use $crate::{gather, primitives, scatter, sort};

            macro_rules! backend_test {
                ($name:ident, $func:path) => {
                    #[test]
                    fn $name() {
                        let backend = ($backend_ctor)();
                        $func(&backend);
                    }
                };
            }

            backend_test!(materialize_round_trips_host_payloads, primitives::materialize_round_trips_host_payloads);
            backend_test!(slice_copies_bounded_region, primitives::slice_copies_bounded_region);
            backend_test!(slice_update_derives_new_array, primitives::slice_update_derives_new_array);
            backend_test!(reshape_preserves_row_major_order, primitives::reshape_preserves_row_major_order);
            backend_test!(compare_counts_matches_via_reduce_sum, primitives::compare_counts_matches_via_reduce_sum);
            backend_test!(binary_elementwise_arithmetic, primitives::binary_elementwise_arithmetic);
            backend_test!(reduce_sum_over_axis_keepdims, primitives::reduce_sum_over_axis_keepdims);
            backend_test!(gather_reads_batched_windows, primitives::gather_reads_batched_windows);
            backend_test!(scatter_add_accumulates_duplicate_targets, primitives::scatter_add_accumulates_duplicate_targets);
            backend_test!(argsort_descending_is_stable, primitives::argsort_descending_is_stable);
            backend_test!(take_along_axis_reorders_lanes, primitives::take_along_axis_reorders_lanes);

            backend_test!(gather_matches_reference_fixture, gather::matches_reference_fixture);
            backend_test!(gather_clamps_out_of_range_start_indices, gather::clamps_out_of_range_start_indices);
            backend_test!(gather_whole_elements_when_offset_dims_empty, gather::whole_elements_when_offset_dims_empty);
            backend_test!(gather_rejects_overlapping_axis_roles, gather::rejects_overlapping_axis_roles);

            backend_test!(scatter_matches_reference_fixture, scatter::matches_reference_fixture);
            backend_test!(scatter_discards_out_of_range_targets, scatter::discards_out_of_range_targets);
            backend_test!(scatter_passes_through_when_nothing_lands, scatter::passes_through_when_nothing_lands);
            backend_test!(scatter_round_trip_restores_gathered_windows, scatter::round_trip_restores_gathered_windows);
            backend_test!(scatter_applies_to_every_input_array, scatter::applies_to_every_input_array);

            backend_test!(sort_reorders_co_sorted_arrays, sort::reorders_co_sorted_arrays);
            backend_test!(sort_ascending_along_negative_axis, sort::ascending_along_negative_axis);
            backend_test!(sort_is_stable_for_equal_keys, sort::is_stable_for_equal_keys);
        }
    };
}
