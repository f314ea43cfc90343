//! One entry point over the four ways a frame can be computed.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

use crate::adapters::cluster::local_cluster::{ClusterConfig, LocalCluster};
use crate::adapters::replica::client::{DispatchClient, DispatchConfig, DispatchError};
use crate::core::actions::decompose::decomposer::{COORDINATOR, DecomposeError, render_decomposed};
use crate::core::actions::generate_fractal::scheduled::ScheduledRenderer;
use crate::core::actions::generate_fractal::serial::render_serial;
use crate::core::actions::ports::communicator::{Communicator, TransportError};
use crate::core::actions::schedule::policy::{ScheduleConfig, ScheduleError};
use crate::core::data::fractal_params::FractalParams;
use crate::core::data::image_dims::ImageDims;
use crate::core::data::pixel_buffer::PixelBuffer;
use crate::core::fractals::julia::algorithm::JuliaAlgorithm;
use crate::core::fractals::julia::colour_mapping::factory::julia_colour_map_factory;

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionMode {
    Sequential,
    SharedMemory(ScheduleConfig),
    /// Row decomposition with halo exchange and a 5-point blur.
    Distributed(ClusterConfig),
    Replica(DispatchConfig),
}

impl ExecutionMode {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::SharedMemory(_) => "shared-memory",
            Self::Distributed(_) => "distributed",
            Self::Replica(_) => "replica",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Decompose(#[from] DecomposeError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("frame failed after {attempts} attempt(s): {source}")]
    FrameFailed { attempts: u32, source: DispatchError },
    #[error("the coordinator returned no image")]
    MissingImage,
    #[error("render task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Computation {
    pub buffer: PixelBuffer,
    pub elapsed: Duration,
}

enum Backend {
    Sequential,
    SharedMemory(Arc<ScheduledRenderer>),
    Distributed(LocalCluster),
    Replica(DispatchClient),
}

pub struct FractalEngine {
    mode: ExecutionMode,
    backend: Backend,
}

impl FractalEngine {
    pub fn new(mode: ExecutionMode) -> Result<Self, EngineError> {
        let backend = match &mode {
            ExecutionMode::Sequential => Backend::Sequential,
            ExecutionMode::SharedMemory(config) => {
                Backend::SharedMemory(Arc::new(ScheduledRenderer::new(*config)?))
            }
            ExecutionMode::Distributed(config) => Backend::Distributed(LocalCluster::new(*config)?),
            ExecutionMode::Replica(config) => Backend::Replica(DispatchClient::new(config)?),
        };

        debug!(mode = %mode, "engine ready");
        Ok(Self { mode, backend })
    }

    #[must_use]
    pub fn mode(&self) -> &ExecutionMode {
        &self.mode
    }

    /// Computes one frame. CPU-bound modes run on the blocking pool.
    pub async fn compute(
        &self,
        params: &FractalParams,
        dims: ImageDims,
    ) -> Result<Computation, EngineError> {
        let start = Instant::now();
        let params = *params;

        let buffer = match &self.backend {
            Backend::Sequential => {
                tokio::task::spawn_blocking(move || render_sequential(&params, dims)).await?
            }
            Backend::SharedMemory(renderer) => {
                let renderer = Arc::clone(renderer);
                tokio::task::spawn_blocking(move || {
                    let algorithm = JuliaAlgorithm::new(&params, dims);
                    let colour_map =
                        julia_colour_map_factory(params.theme(), params.max_iterations());
                    renderer.render(dims, &algorithm, &colour_map).0
                })
                .await?
            }
            Backend::Distributed(cluster) => {
                let cluster = *cluster;
                tokio::task::spawn_blocking(move || render_distributed(cluster, &params, dims))
                    .await??
            }
            Backend::Replica(client) => {
                let frame = client.request_frame(&params, dims).await;
                match (frame.pixels, frame.error) {
                    (Some(pixels), _) => pixels,
                    (None, Some(source)) => {
                        return Err(EngineError::FrameFailed {
                            attempts: frame.attempts,
                            source,
                        });
                    }
                    (None, None) => return Err(EngineError::MissingImage),
                }
            }
        };

        let elapsed = start.elapsed();
        info!(
            mode = %self.mode,
            width = dims.width(),
            height = dims.height(),
            elapsed_ms = elapsed.as_secs_f64() * 1_000.0,
            "frame computed"
        );

        Ok(Computation { buffer, elapsed })
    }
}

fn render_sequential(params: &FractalParams, dims: ImageDims) -> PixelBuffer {
    let algorithm = JuliaAlgorithm::new(params, dims);
    let colour_map = julia_colour_map_factory(params.theme(), params.max_iterations());

    render_serial(dims, &algorithm, &colour_map)
}

/// Runs every rank of the cluster and returns the coordinator's assembled image.
pub fn render_distributed(
    cluster: LocalCluster,
    params: &FractalParams,
    dims: ImageDims,
) -> Result<PixelBuffer, EngineError> {
    let outcomes = cluster.run(|comm| {
        let root_dims = (comm.rank() == COORDINATOR).then_some(dims);
        render_decomposed(comm, root_dims, |dims| {
            (
                JuliaAlgorithm::new(params, dims),
                julia_colour_map_factory(params.theme(), params.max_iterations()),
            )
        })
    })?;

    let mut image = None;
    for outcome in outcomes {
        if let Some(assembled) = outcome?.image {
            image = Some(assembled);
        }
    }

    image.ok_or(EngineError::MissingImage)
}
