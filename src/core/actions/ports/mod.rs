pub mod colour_map;
pub mod communicator;
pub mod fractal_algorithm;
