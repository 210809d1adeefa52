shlo_rs_backend_tests::define_backend_tests!(cpu_reference, || std::sync::Arc::new(
    shlo_rs_backend_ref_cpu::CpuBackend::new()
));
