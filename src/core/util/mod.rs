pub mod even_split;
pub mod pixel_to_complex_coords;
pub mod resolve_worker_count;
