//! Layered configuration.
//!
//! Values resolve in this order, later layers winning:
//! struct defaults, the TOML file, a `.env` file, then process environment
//! variables named `LOGENGINE__<SECTION>__<KEY>`, for example
//! `LOGENGINE__ENGINE__BUFFER_CAPACITY=4096` or
//! `LOGENGINE__SERVER__API__MAX_BODY_BYTES=1MB`.
//!
//! The file is `config/logengine.toml` unless `LOGENGINE_CONFIG` or an
//! explicit path says otherwise. Every loaded config is validated before it
//! is returned.
//!
//! ```no_run
//! use logengine::config::Config;
//!
//! # fn main() -> Result<(), logengine::config::ConfigError> {
//! let config = Config::load()?;
//! assert!(config.engine.buffer_capacity > 0);
//! # Ok(())
//! # }
//! ```

mod models;
mod sources;
mod validation;

pub use crate::humanize::ByteSize;
pub use models::{
    ApiLimits, Config, EngineConfig, HealthConfig, LogFormat, ServerConfig, TelemetryConfig,
};
pub use validation::{ValidationError, validate_engine};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] ValidationError),
}

impl Config {
    /// Resolve every layer using the default file lookup.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(None)
    }

    /// Resolve every layer; `path` replaces the default file lookup.
    pub fn load_with(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::checked(sources::load(path)?)
    }

    /// Resolve a specific file plus the environment, skipping `.env`.
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        Self::checked(sources::load_from_sources(path)?)
    }

    fn checked(config: Self) -> Result<Self, ConfigError> {
        validation::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[engine]
buffer_capacity = 128
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.engine.buffer_capacity, 128);
        assert_eq!(config.health.min_window_samples, 10);
    }

    #[test]
    fn test_validation_catches_zero_capacity() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[engine]
buffer_capacity = 0
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let err = Config::load_from_path(config_path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ValidationError::ZeroBufferCapacity)));
        assert!(err.to_string().contains("buffer_capacity"));
    }

    #[test]
    fn test_serialized_defaults_load_back() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("defaults.toml");

        let rendered = toml::to_string(&Config::default()).unwrap();
        fs::write(&config_path, rendered).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.server.api.max_body_bytes, ByteSize(64 * 1024));
        assert_eq!(config.engine.process_batch_size, 200);
        assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_full_config_example() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[server]
bind_addr = "127.0.0.1:8181"

[server.api]
max_body_bytes = "256KB"
max_process_items = 1000

[engine]
buffer_capacity = 4096
process_batch_size = 100
auto_process_threshold = 2048
pending_preview_limit = 50

[health]
queue_depth_threshold = 3000
failure_rate_threshold = 0.2
failure_window_secs = 120
min_window_samples = 20

[telemetry]
log_level = "logengine=debug,tower_http=info"
log_format = "json"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();

        assert_eq!(config.server.bind_addr.port(), 8181);
        assert_eq!(config.server.api.max_body_bytes.as_u64(), 256 * 1024);
        assert_eq!(config.engine.pending_preview_limit, Some(50));
        assert_eq!(config.health.failure_window_secs, 120);
        assert_eq!(config.telemetry.log_format, LogFormat::Json);
        assert!(config.telemetry.log_level.starts_with("logengine=debug"));
    }
}
