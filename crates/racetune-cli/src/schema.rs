pub mod bench_report;
