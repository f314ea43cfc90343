use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("unknown schedule policy '{0}', expected static, dynamic or guided")]
    UnknownPolicy(String),
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// How the pixel index space is handed out to workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulePolicy {
    /// One contiguous chunk per worker, assigned up front.
    #[default]
    Static,
    /// Fixed-size chunks pulled from a shared queue.
    Dynamic,
    /// Queue chunks that start at `remaining / workers` and shrink toward a minimum.
    Guided,
}

impl SchedulePolicy {
    pub const ALL: &'static [Self] = &[Self::Static, Self::Dynamic, Self::Guided];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
            Self::Guided => "guided",
        }
    }

    /// Lenient parse for configuration input: unknown names fall back to static.
    #[must_use]
    pub fn parse_or_static(value: &str) -> Self {
        value.parse().unwrap_or_else(|err: ScheduleError| {
            warn!(policy = value, error = %err, "falling back to static schedule");
            Self::Static
        })
    }
}

impl FromStr for SchedulePolicy {
    type Err = ScheduleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "dynamic" => Ok(Self::Dynamic),
            "guided" => Ok(Self::Guided),
            _ => Err(ScheduleError::UnknownPolicy(value.to_string())),
        }
    }
}

impl fmt::Display for SchedulePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub policy: SchedulePolicy,
    /// `0` means one worker per available processing unit.
    #[serde(default)]
    pub threads: usize,
    /// Dynamic chunk size, or the guided minimum chunk size, in pixels.
    #[serde(default)]
    pub chunk_size: Option<usize>,
}

impl ScheduleConfig {
    #[must_use]
    pub fn new(policy: SchedulePolicy, threads: usize) -> Self {
        Self {
            policy,
            threads,
            chunk_size: None,
        }
    }

    #[must_use]
    pub fn from_names(policy: &str, threads: usize) -> Self {
        Self::new(SchedulePolicy::parse_or_static(policy), threads)
    }

    #[must_use]
    pub fn with_chunk_size(self, chunk_size: usize) -> Self {
        Self {
            chunk_size: Some(chunk_size),
            ..self
        }
    }
}
