pub mod cluster;
pub mod replica;
