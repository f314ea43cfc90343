use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::adapters::replica::wire::{
    CALCULATE_JULIA_PATH, CALCULATION_TIME_HEADER, ComputeRequest, HEALTH_PATH, HealthResponse,
    SERVER_ID_HEADER, SHUTDOWN_PATH, ShutdownResponse, WireError,
};
use crate::core::actions::generate_fractal::scheduled::ScheduledRenderer;
use crate::core::actions::schedule::policy::{ScheduleConfig, ScheduleError};
use crate::core::data::fractal_params::FractalParams;
use crate::core::data::image_dims::ImageDims;
use crate::core::data::image_dims::ImageDimsError;
use crate::core::data::pixel_buffer::{PixelBuffer, PixelBufferError};
use crate::core::fractals::julia::algorithm::JuliaAlgorithm;
use crate::core::fractals::julia::colour_mapping::factory::julia_colour_map_factory;

pub const DEFAULT_PORT: u16 = 50051;
pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 100;

fn default_grace_ms() -> u64 {
    DEFAULT_SHUTDOWN_GRACE_MS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicaServerConfig {
    pub server_id: String,
    pub bind: SocketAddr,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Delay between acknowledging Shutdown and closing the listener.
    #[serde(default = "default_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl Default for ReplicaServerConfig {
    fn default() -> Self {
        Self {
            server_id: format!("server-{DEFAULT_PORT}"),
            bind: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            schedule: ScheduleConfig::default(),
            shutdown_grace_ms: DEFAULT_SHUTDOWN_GRACE_MS,
        }
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },
    #[error("server id '{0}' is not a valid header value")]
    InvalidServerId(String),
    #[error("failed to start renderer: {0}")]
    Schedule(#[from] ScheduleError),
    #[error("server failed: {0}")]
    Io(#[from] io::Error),
    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Makes exactly the next CalculateJulia call fail with 503.
///
/// Held per server instance so several servers can share one test process.
#[derive(Debug, Default)]
pub struct FaultInjector {
    fail_next: AtomicBool,
}

impl FaultInjector {
    pub fn fail_next_call(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.fail_next.load(Ordering::SeqCst)
    }

    fn take(&self) -> bool {
        self.fail_next.swap(false, Ordering::SeqCst)
    }
}

struct ReplicaState {
    server_id: String,
    server_id_header: HeaderValue,
    renderer: ScheduledRenderer,
    faults: Arc<FaultInjector>,
    shutdown: Notify,
    grace: Duration,
}

impl ReplicaState {
    fn render(
        &self,
        params: &FractalParams,
        dims: ImageDims,
    ) -> Result<(PixelBuffer, Duration), PixelBufferError> {
        let algorithm = JuliaAlgorithm::new(params, dims);
        let colour_map = julia_colour_map_factory(params.theme(), params.max_iterations());
        let mut buffer = PixelBuffer::try_new(dims)?;
        let report = self.renderer.render_into(&mut buffer, &algorithm, &colour_map);

        Ok((buffer, report.elapsed))
    }
}

/// A stateless compute replica: each request renders one frame with the
/// shared-memory renderer and returns the raw RGBA bytes.
pub struct ReplicaServer {
    state: Arc<ReplicaState>,
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl ReplicaServer {
    pub async fn bind(config: ReplicaServerConfig) -> Result<Self, ServerError> {
        let server_id_header = HeaderValue::from_str(&config.server_id)
            .map_err(|_| ServerError::InvalidServerId(config.server_id.clone()))?;
        let renderer = ScheduledRenderer::new(config.schedule)?;
        let listener = TcpListener::bind(config.bind)
            .await
            .map_err(|source| ServerError::Bind {
                addr: config.bind,
                source,
            })?;
        let local_addr = listener.local_addr()?;

        info!(
            server_id = %config.server_id,
            addr = %local_addr,
            policy = %config.schedule.policy,
            workers = renderer.workers(),
            "replica bound"
        );

        Ok(Self {
            state: Arc::new(ReplicaState {
                server_id: config.server_id,
                server_id_header,
                renderer,
                faults: Arc::new(FaultInjector::default()),
                shutdown: Notify::new(),
                grace: Duration::from_millis(config.shutdown_grace_ms),
            }),
            listener,
            local_addr,
        })
    }

    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    #[must_use]
    pub fn fault_injector(&self) -> Arc<FaultInjector> {
        Arc::clone(&self.state.faults)
    }

    /// Serves until a Shutdown call or a [`ShutdownTrigger`] stops it.
    pub async fn serve(self) -> Result<(), ServerError> {
        let state = Arc::clone(&self.state);
        let app = router(Arc::clone(&self.state));

        axum::serve(self.listener, app)
            .with_graceful_shutdown(async move { state.shutdown.notified().await })
            .await?;

        info!(server_id = %self.state.server_id, "replica stopped");
        Ok(())
    }

    /// Runs the server on the current tokio runtime.
    #[must_use]
    pub fn spawn(self) -> RunningReplica {
        let addr = self.local_addr;
        let faults = self.fault_injector();
        let state = Arc::clone(&self.state);

        RunningReplica {
            addr,
            faults,
            state,
            handle: tokio::spawn(self.serve()),
        }
    }
}

pub struct RunningReplica {
    pub addr: SocketAddr,
    pub faults: Arc<FaultInjector>,
    state: Arc<ReplicaState>,
    handle: JoinHandle<Result<(), ServerError>>,
}

impl RunningReplica {
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// A cloneable handle that stops the server from another task.
    #[must_use]
    pub fn shutdown_trigger(&self) -> ShutdownTrigger {
        ShutdownTrigger {
            state: Arc::clone(&self.state),
        }
    }

    pub async fn stopped(self) -> Result<(), ServerError> {
        self.handle.await?
    }
}

#[derive(Clone)]
pub struct ShutdownTrigger {
    state: Arc<ReplicaState>,
}

impl ShutdownTrigger {
    pub fn fire(&self) {
        self.state.shutdown.notify_one();
    }
}

fn router(state: Arc<ReplicaState>) -> Router {
    Router::new()
        .route(CALCULATE_JULIA_PATH, post(calculate_julia))
        .route(SHUTDOWN_PATH, post(shutdown))
        .route(HEALTH_PATH, get(health))
        .with_state(state)
}

/// POST /fractal.FractalService/CalculateJulia
async fn calculate_julia(
    State(state): State<Arc<ReplicaState>>,
    Json(request): Json<ComputeRequest>,
) -> Response {
    if state.faults.take() {
        warn!(server_id = %state.server_id, "injected failure, answering unavailable");
        return (StatusCode::SERVICE_UNAVAILABLE, "simulated failure").into_response();
    }

    let (params, dims) = match request.to_params() {
        Ok(validated) => validated,
        Err(err) => {
            warn!(server_id = %state.server_id, error = %err, "rejecting request");
            let status = match err {
                WireError::Dims(ImageDimsError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
                _ => StatusCode::BAD_REQUEST,
            };
            return (status, err.to_string()).into_response();
        }
    };

    let worker = Arc::clone(&state);
    let rendered = tokio::task::spawn_blocking(move || worker.render(&params, dims)).await;

    match rendered {
        Ok(Ok((buffer, elapsed))) => {
            let calculation_time_ms = elapsed.as_secs_f64() * 1_000.0;
            info!(
                server_id = %state.server_id,
                width = dims.width(),
                height = dims.height(),
                calculation_time_ms,
                "frame computed"
            );

            let mut headers = HeaderMap::new();
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            );
            headers.insert(SERVER_ID_HEADER, state.server_id_header.clone());
            if let Ok(value) = HeaderValue::from_str(&format!("{calculation_time_ms:.3}")) {
                headers.insert(CALCULATION_TIME_HEADER, value);
            }

            (StatusCode::OK, headers, Bytes::from(buffer.into_data())).into_response()
        }
        Ok(Err(err)) => {
            warn!(server_id = %state.server_id, error = %err, "no memory for frame");
            (StatusCode::SERVICE_UNAVAILABLE, err.to_string()).into_response()
        }
        Err(err) => {
            error!(server_id = %state.server_id, error = %err, "render task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "render failed").into_response()
        }
    }
}

/// POST /fractal.FractalService/Shutdown
async fn shutdown(State(state): State<Arc<ReplicaState>>) -> Json<ShutdownResponse> {
    info!(
        server_id = %state.server_id,
        grace_ms = state.grace.as_millis() as u64,
        "shutdown requested"
    );

    let stopping = Arc::clone(&state);
    tokio::spawn(async move {
        tokio::time::sleep(stopping.grace).await;
        stopping.shutdown.notify_one();
    });

    Json(ShutdownResponse {
        message: format!("Server {} shutting down", state.server_id),
    })
}

/// GET /health
async fn health(State(state): State<Arc<ReplicaState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        server_id: state.server_id.clone(),
    })
}
