pub mod decompose;
pub mod generate_fractal;
pub mod ports;
pub mod schedule;
