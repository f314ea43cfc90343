use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// How a failed attempt is classified, named after the matching gRPC codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureClass {
    Unavailable,
    DeadlineExceeded,
    /// The replica answered with a status that says the request itself is bad.
    InvalidArgument,
    Internal,
}

#[derive(Debug, Error)]
pub enum RetryConfigError {
    #[error("failed to parse retry config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("service config has no retryPolicy")]
    MissingRetryPolicy,
    #[error("invalid retry policy: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    pub max_attempts: u32,
    #[serde(with = "seconds")]
    pub initial_backoff: Duration,
    #[serde(with = "seconds")]
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
    pub retryable_status_codes: Vec<FailureClass>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            retryable_status_codes: vec![FailureClass::Unavailable, FailureClass::DeadlineExceeded],
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceConfig {
    #[serde(default)]
    method_config: Vec<MethodConfig>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MethodConfig {
    retry_policy: Option<RetryPolicy>,
}

impl RetryPolicy {
    /// Reads the first `retryPolicy` out of a gRPC-style service config:
    /// `{"methodConfig": [{"retryPolicy": {...}}]}`.
    pub fn from_service_config(json: &str) -> Result<Self, RetryConfigError> {
        let config: ServiceConfig = serde_json::from_str(json)?;
        let policy = config
            .method_config
            .into_iter()
            .find_map(|method| method.retry_policy)
            .ok_or(RetryConfigError::MissingRetryPolicy)?;

        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), RetryConfigError> {
        if self.max_attempts == 0 {
            return Err(RetryConfigError::Invalid("maxAttempts must be at least 1".into()));
        }

        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier <= 0.0 {
            return Err(RetryConfigError::Invalid(format!(
                "backoffMultiplier must be positive, got {}",
                self.backoff_multiplier
            )));
        }

        Ok(())
    }

    #[must_use]
    pub fn is_retryable(&self, class: FailureClass) -> bool {
        self.retryable_status_codes.contains(&class)
    }

    /// Pause after the `failed_attempt`-th attempt (1-based):
    /// `initial * multiplier^(failed_attempt - 1)`, capped at `max_backoff`.
    #[must_use]
    pub fn backoff(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let nanos = self.initial_backoff.as_nanos() as f64 * self.backoff_multiplier.powi(exponent);
        let capped = nanos.min(self.max_backoff.as_nanos() as f64);

        Duration::from_nanos(capped.round() as u64)
    }
}

/// Durations as gRPC service-config strings such as `"0.1s"`.
mod seconds {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{}s", duration.as_secs_f64()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let seconds = raw
            .strip_suffix('s')
            .ok_or_else(|| D::Error::custom(format!("duration '{raw}' must end in 's'")))?
            .parse::<f64>()
            .map_err(D::Error::custom)?;

        if !seconds.is_finite() || seconds < 0.0 {
            return Err(D::Error::custom(format!("duration '{raw}' is out of range")));
        }

        Ok(Duration::from_nanos((seconds * 1e9).round() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVICE_CONFIG: &str = r#"{
        "loadBalancingConfig": [{"round_robin": {}}],
        "methodConfig": [{
            "name": [{"service": "fractal.FractalService"}],
            "retryPolicy": {
                "maxAttempts": 3,
                "initialBackoff": "0.1s",
                "maxBackoff": "1s",
                "backoffMultiplier": 2,
                "retryableStatusCodes": ["UNAVAILABLE", "DEADLINE_EXCEEDED"]
            }
        }]
    }"#;

    #[test]
    fn test_parses_service_config() {
        let policy = RetryPolicy::from_service_config(SERVICE_CONFIG).unwrap();

        assert_eq!(policy, RetryPolicy::default());
    }

    #[test]
    fn test_missing_retry_policy_is_an_error() {
        let result = RetryPolicy::from_service_config(r#"{"methodConfig": [{}]}"#);

        assert!(matches!(result, Err(RetryConfigError::MissingRetryPolicy)));
    }

    #[test]
    fn test_bad_duration_is_an_error() {
        let json = SERVICE_CONFIG.replace("\"0.1s\"", "\"100ms\"");

        assert!(matches!(
            RetryPolicy::from_service_config(&json),
            Err(RetryConfigError::Json(_))
        ));
    }

    #[test]
    fn test_zero_attempts_is_invalid() {
        let json = SERVICE_CONFIG.replace("\"maxAttempts\": 3", "\"maxAttempts\": 0");

        assert!(matches!(
            RetryPolicy::from_service_config(&json),
            Err(RetryConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_backoff_grows_then_caps() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
        assert_eq!(policy.backoff(5), Duration::from_secs(1));
        assert_eq!(policy.backoff(500), Duration::from_secs(1));
    }

    #[test]
    fn test_only_configured_classes_retry() {
        let policy = RetryPolicy::default();

        assert!(policy.is_retryable(FailureClass::Unavailable));
        assert!(policy.is_retryable(FailureClass::DeadlineExceeded));
        assert!(!policy.is_retryable(FailureClass::InvalidArgument));
        assert!(!policy.is_retryable(FailureClass::Internal));
    }

    #[test]
    fn test_serialises_durations_as_seconds_strings() {
        let json = serde_json::to_value(RetryPolicy::default()).unwrap();

        assert_eq!(json["initialBackoff"], "0.1s");
        assert_eq!(json["maxBackoff"], "1s");
        assert_eq!(json["retryableStatusCodes"][1], "DEADLINE_EXCEEDED");
    }
}
