pub mod chunk_plan;
pub mod policy;
