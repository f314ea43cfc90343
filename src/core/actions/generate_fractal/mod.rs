pub mod scheduled;
pub mod serial;
