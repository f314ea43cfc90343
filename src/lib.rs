pub mod adapters;
pub mod controllers;
pub mod core;
pub mod engine;
pub mod storage;

pub use crate::adapters::cluster::local_cluster::{ClusterConfig, LocalCluster};
pub use crate::adapters::replica::client::{DispatchClient, DispatchConfig, FrameResult};
pub use crate::adapters::replica::retry::RetryPolicy;
pub use crate::adapters::replica::server::{ReplicaServer, ReplicaServerConfig};
pub use crate::core::actions::schedule::policy::{ScheduleConfig, SchedulePolicy};
pub use crate::core::data::fractal_params::FractalParams;
pub use crate::core::data::image_dims::ImageDims;
pub use crate::core::data::pixel_buffer::PixelBuffer;
pub use crate::engine::{Computation, EngineError, ExecutionMode, FractalEngine};
