pub mod client;
pub mod metrics_log;
pub mod retry;
pub mod server;
pub mod wire;
