pub mod blur;
pub mod decomposer;
pub mod partition;
pub mod tile;
