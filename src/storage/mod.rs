pub mod benchmark_csv;
pub mod write_ppm;
