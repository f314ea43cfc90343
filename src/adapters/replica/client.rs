use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::adapters::replica::metrics_log::{
    AttemptRecord, CsvMetricsSink, MetricsSink, NoopMetricsSink,
};
use crate::adapters::replica::retry::{FailureClass, RetryPolicy};
use crate::adapters::replica::wire::{
    CALCULATE_JULIA_PATH, CALCULATION_TIME_HEADER, ComputeRequest, ComputeResponse,
    SERVER_ID_HEADER, SHUTDOWN_PATH, ShutdownResponse,
};
use crate::core::data::fractal_params::FractalParams;
use crate::core::data::image_dims::ImageDims;
use crate::core::data::pixel_buffer::PixelBuffer;

pub const DEFAULT_REPLICAS: &[&str] = &["127.0.0.1:50051", "127.0.0.1:50052"];
pub const DEFAULT_ATTEMPT_TIMEOUT_MS: u64 = 5_000;

fn default_attempt_timeout_ms() -> u64 {
    DEFAULT_ATTEMPT_TIMEOUT_MS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// `host:port` or full `http://` URLs, tried round-robin.
    pub endpoints: Vec<String>,
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Deadline for a single attempt, including reading the pixels.
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,
    /// Optional CSV file receiving one row per attempt.
    #[serde(default)]
    pub metrics_path: Option<PathBuf>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            endpoints: DEFAULT_REPLICAS.iter().map(|e| e.to_string()).collect(),
            retry: RetryPolicy::default(),
            attempt_timeout_ms: DEFAULT_ATTEMPT_TIMEOUT_MS,
            metrics_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("replica {endpoint} unavailable: {reason}")]
    Unavailable { endpoint: String, reason: String },
    #[error("replica {endpoint} missed its deadline: {reason}")]
    DeadlineExceeded { endpoint: String, reason: String },
    #[error("replica {endpoint} rejected the request with {status}: {body}")]
    Rejected {
        endpoint: String,
        status: u16,
        body: String,
    },
    #[error("replica {endpoint} sent a malformed response: {reason}")]
    Protocol { endpoint: String, reason: String },
    #[error("no replica endpoints configured")]
    NoEndpoints,
    #[error("failed to build http client: {0}")]
    Client(String),
    #[error("failed to open metrics log {path}: {reason}")]
    MetricsLog { path: String, reason: String },
}

impl DispatchError {
    #[must_use]
    pub fn class(&self) -> FailureClass {
        match self {
            Self::Unavailable { .. } => FailureClass::Unavailable,
            Self::DeadlineExceeded { .. } => FailureClass::DeadlineExceeded,
            Self::Rejected { status, .. } if *status < 500 => FailureClass::InvalidArgument,
            _ => FailureClass::Internal,
        }
    }
}

/// Result of [`DispatchClient::request_frame`]. Failure is a value, not an
/// error; the caller decides whether to keep showing its previous frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameResult {
    pub pixels: Option<PixelBuffer>,
    pub success: bool,
    /// Wall-clock time across every attempt and backoff.
    pub latency: Duration,
    pub attempts: u32,
    pub server_id: Option<String>,
    pub calculation_time_ms: Option<f64>,
    pub error: Option<DispatchError>,
}

/// Sends frames to a fixed set of replicas, round-robin, with bounded retries.
pub struct DispatchClient {
    http: reqwest::Client,
    endpoints: Vec<String>,
    cursor: AtomicUsize,
    retry: RetryPolicy,
    metrics: Arc<dyn MetricsSink>,
    started: Instant,
}

impl std::fmt::Debug for DispatchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchClient")
            .field("endpoints", &self.endpoints)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl DispatchClient {
    /// Builds a client whose per-attempt log goes to `config.metrics_path`, if set.
    pub fn new(config: &DispatchConfig) -> Result<Self, DispatchError> {
        if config.endpoints.is_empty() {
            return Err(DispatchError::NoEndpoints);
        }

        let metrics: Arc<dyn MetricsSink> = match &config.metrics_path {
            Some(path) => Arc::new(CsvMetricsSink::create(path).map_err(|err| {
                DispatchError::MetricsLog {
                    path: path.display().to_string(),
                    reason: err.to_string(),
                }
            })?),
            None => Arc::new(NoopMetricsSink),
        };

        Self::with_metrics(config, metrics)
    }

    pub fn with_metrics(
        config: &DispatchConfig,
        metrics: Arc<dyn MetricsSink>,
    ) -> Result<Self, DispatchError> {
        if config.endpoints.is_empty() {
            return Err(DispatchError::NoEndpoints);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.attempt_timeout_ms))
            .tcp_nodelay(true)
            .build()
            .map_err(|err| DispatchError::Client(err.to_string()))?;

        Ok(Self {
            http,
            endpoints: config.endpoints.iter().map(|e| base_url(e)).collect(),
            cursor: AtomicUsize::new(0),
            retry: config.retry.clone(),
            metrics,
            started: Instant::now(),
        })
    }

    #[must_use]
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    fn next_endpoint(&self) -> &str {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.endpoints.len();
        &self.endpoints[index]
    }

    pub async fn request_frame(&self, params: &FractalParams, dims: ImageDims) -> FrameResult {
        let request = ComputeRequest::new(params, dims);
        let started = Instant::now();
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let endpoint = self.next_endpoint();
            let attempt_started = Instant::now();
            let outcome = self.call(endpoint, &request, dims).await;

            self.metrics.record(AttemptRecord {
                timestamp: self.started.elapsed(),
                latency: attempt_started.elapsed(),
                success: outcome.is_ok(),
                attempt,
                replica: endpoint.to_string(),
            });

            let err = match outcome {
                Ok((pixels, response)) => {
                    debug!(
                        endpoint,
                        attempt,
                        server_id = %response.server_id,
                        calculation_time_ms = response.calculation_time_ms,
                        "frame received"
                    );

                    return FrameResult {
                        pixels: Some(pixels),
                        success: true,
                        latency: started.elapsed(),
                        attempts: attempt,
                        server_id: Some(response.server_id),
                        calculation_time_ms: Some(response.calculation_time_ms),
                        error: None,
                    };
                }
                Err(err) => err,
            };

            let retryable = self.retry.is_retryable(err.class());
            if !retryable || attempt >= max_attempts {
                error!(endpoint, attempt, retryable, error = %err, "frame request failed");

                return FrameResult {
                    pixels: None,
                    success: false,
                    latency: started.elapsed(),
                    attempts: attempt,
                    server_id: None,
                    calculation_time_ms: None,
                    error: Some(err),
                };
            }

            let delay = self.retry.backoff(attempt);
            warn!(
                endpoint,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "frame request failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn call(
        &self,
        endpoint: &str,
        request: &ComputeRequest,
        dims: ImageDims,
    ) -> Result<(PixelBuffer, ComputeResponse), DispatchError> {
        let response = self
            .http
            .post(format!("{endpoint}{CALCULATE_JULIA_PATH}"))
            .json(request)
            .send()
            .await
            .map_err(|err| classify_transport(endpoint, &err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(endpoint, status, body));
        }

        let calculation_time_ms = header(&response, CALCULATION_TIME_HEADER)
            .and_then(|value| value.parse::<f64>().ok())
            .unwrap_or_default();
        let server_id = header(&response, SERVER_ID_HEADER).unwrap_or_else(|| endpoint.to_string());

        let rgba_data = response
            .bytes()
            .await
            .map_err(|err| classify_transport(endpoint, &err))?
            .to_vec();

        let pixels = PixelBuffer::from_data(dims, rgba_data.clone()).map_err(|err| {
            DispatchError::Protocol {
                endpoint: endpoint.to_string(),
                reason: err.to_string(),
            }
        })?;

        Ok((
            pixels,
            ComputeResponse {
                rgba_data,
                calculation_time_ms,
                server_id,
            },
        ))
    }

    /// Asks one replica to stop. The replica answers before it goes away.
    pub async fn shutdown_replica(&self, endpoint: &str) -> Result<String, DispatchError> {
        let endpoint = base_url(endpoint);
        let response = self
            .http
            .post(format!("{endpoint}{SHUTDOWN_PATH}"))
            .send()
            .await
            .map_err(|err| classify_transport(&endpoint, &err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(&endpoint, status, body));
        }

        let ack: ShutdownResponse = response.json().await.map_err(|err| DispatchError::Protocol {
            endpoint: endpoint.clone(),
            reason: err.to_string(),
        })?;
        info!(endpoint = %endpoint, message = %ack.message, "replica acknowledged shutdown");

        Ok(ack.message)
    }
}

fn base_url(endpoint: &str) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');

    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

fn header(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn classify_transport(endpoint: &str, err: &reqwest::Error) -> DispatchError {
    let endpoint = endpoint.to_string();
    let reason = err.to_string();

    if err.is_timeout() {
        DispatchError::DeadlineExceeded { endpoint, reason }
    } else if err.is_connect() || err.is_request() {
        DispatchError::Unavailable { endpoint, reason }
    } else {
        DispatchError::Protocol { endpoint, reason }
    }
}

fn classify_status(endpoint: &str, status: StatusCode, body: String) -> DispatchError {
    let endpoint = endpoint.to_string();

    match status {
        StatusCode::SERVICE_UNAVAILABLE => DispatchError::Unavailable {
            endpoint,
            reason: body,
        },
        StatusCode::GATEWAY_TIMEOUT => DispatchError::DeadlineExceeded {
            endpoint,
            reason: body,
        },
        _ => DispatchError::Rejected {
            endpoint,
            status: status.as_u16(),
            body,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_adds_scheme() {
        assert_eq!(base_url("127.0.0.1:50051"), "http://127.0.0.1:50051");
        assert_eq!(base_url("http://replica:8080/"), "http://replica:8080");
        assert_eq!(base_url("https://replica"), "https://replica");
    }

    #[test]
    fn test_status_classification() {
        let classify = |code: u16| {
            classify_status("r", StatusCode::from_u16(code).unwrap(), String::new()).class()
        };

        assert_eq!(classify(503), FailureClass::Unavailable);
        assert_eq!(classify(504), FailureClass::DeadlineExceeded);
        assert_eq!(classify(400), FailureClass::InvalidArgument);
        assert_eq!(classify(422), FailureClass::InvalidArgument);
        assert_eq!(classify(500), FailureClass::Internal);
    }

    #[test]
    fn test_empty_endpoint_list_is_rejected() {
        let config = DispatchConfig {
            endpoints: Vec::new(),
            ..DispatchConfig::default()
        };

        assert_eq!(DispatchClient::new(&config).unwrap_err(), DispatchError::NoEndpoints);
    }

    #[test]
    fn test_unopenable_metrics_log_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = DispatchConfig {
            metrics_path: Some(dir.path().join("missing").join("metrics_log.csv")),
            ..DispatchConfig::default()
        };

        assert!(matches!(
            DispatchClient::new(&config),
            Err(DispatchError::MetricsLog { .. })
        ));
    }

    #[test]
    fn test_endpoints_rotate_round_robin() {
        let client = DispatchClient::new(&DispatchConfig::default()).unwrap();

        let picked: Vec<String> = (0..4).map(|_| client.next_endpoint().to_string()).collect();

        assert_eq!(
            picked,
            vec![
                "http://127.0.0.1:50051",
                "http://127.0.0.1:50052",
                "http://127.0.0.1:50051",
                "http://127.0.0.1:50052"
            ]
        );
    }

    #[test]
    fn test_default_config_matches_reference_deployment() {
        let config = DispatchConfig::default();

        assert_eq!(config.endpoints, vec!["127.0.0.1:50051", "127.0.0.1:50052"]);
        assert_eq!(config.retry.max_attempts, 3);
    }
}
