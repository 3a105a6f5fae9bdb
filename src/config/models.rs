use crate::humanize::ByteSize;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// HTTP façade configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default)]
    pub api: ApiLimits,
}

/// Request limits enforced by the façade before the engine is called
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiLimits {
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: ByteSize,
    /// Upper bound for `max_items` on `POST /process`
    #[serde(default = "default_max_process_items")]
    pub max_process_items: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            api: ApiLimits::default(),
        }
    }
}

impl Default for ApiLimits {
    fn default() -> Self {
        Self {
            max_body_bytes: default_max_body_bytes(),
            max_process_items: default_max_process_items(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8000))
}

fn default_max_body_bytes() -> ByteSize {
    ByteSize(64 * 1024) // 64 KB
}

fn default_max_process_items() -> usize {
    100_000
}

/// Queue and batch settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Maximum number of pending entries
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
    /// Entries per automatically triggered batch
    #[serde(default = "default_process_batch_size")]
    pub process_batch_size: usize,
    /// Queue depth that triggers a batch on enqueue; disabled when unset
    #[serde(default)]
    pub auto_process_threshold: Option<usize>,
    /// Cap on items returned by `get_pending_logs`; unlimited when unset
    #[serde(default)]
    pub pending_preview_limit: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: default_buffer_capacity(),
            process_batch_size: default_process_batch_size(),
            auto_process_threshold: None,
            pending_preview_limit: None,
        }
    }
}

fn default_buffer_capacity() -> usize {
    2048
}

fn default_process_batch_size() -> usize {
    200
}

/// Health thresholds
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthConfig {
    /// Depth above which the queue check reports `high`
    #[serde(default = "default_queue_depth_threshold")]
    pub queue_depth_threshold: usize,
    #[serde(default = "default_failure_rate_threshold")]
    pub failure_rate_threshold: f64,
    #[serde(default = "default_failure_window_secs")]
    pub failure_window_secs: u64,
    /// Entries needed in the window before the failure rate is acted on
    #[serde(default = "default_min_window_samples")]
    pub min_window_samples: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            queue_depth_threshold: default_queue_depth_threshold(),
            failure_rate_threshold: default_failure_rate_threshold(),
            failure_window_secs: default_failure_window_secs(),
            min_window_samples: default_min_window_samples(),
        }
    }
}

fn default_queue_depth_threshold() -> usize {
    1024
}

fn default_failure_rate_threshold() -> f64 {
    0.5
}

fn default_failure_window_secs() -> u64 {
    60
}

fn default_min_window_samples() -> u64 {
    10
}

/// Tracing output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
