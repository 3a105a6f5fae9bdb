use super::models::Config;
use config::{ConfigError, Environment, File, FileFormat};
use std::env;
use std::path::PathBuf;
use tracing::{debug, warn};

const PATH_VAR: &str = "LOGENGINE_CONFIG";
const DEFAULT_PATH: &str = "config/logengine.toml";
const ENV_PREFIX: &str = "LOGENGINE";

/// Full lookup: `.env` is merged into the process environment first, then
/// the file and environment layers are resolved.
pub fn load(path: Option<PathBuf>) -> Result<Config, ConfigError> {
    match dotenvy::dotenv() {
        Ok(env_file) => debug!(path = %env_file.display(), "Loaded .env file"),
        Err(err) if err.not_found() => {}
        Err(err) => warn!(error = %err, "Ignoring unreadable .env file"),
    }

    let path = path
        .or_else(|| env::var_os(PATH_VAR).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PATH));

    load_from_sources(path)
}

/// Struct defaults, then `path` when it exists, then `LOGENGINE__*`
/// variables (`LOGENGINE__ENGINE__BUFFER_CAPACITY` -> `engine.buffer_capacity`).
pub fn load_from_sources(path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if path.is_file() {
        debug!(path = %path.display(), "Reading configuration file");
        builder = builder.add_source(File::from(path).format(FileFormat::Toml));
    } else {
        warn!(
            path = %path.display(),
            "No configuration file, using defaults and environment"
        );
    }

    builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();

        let config = load_from_sources(temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.bind_addr.to_string(), "0.0.0.0:8000");
        assert_eq!(config.engine.buffer_capacity, 2048);
    }

    #[test]
    fn test_file_layer_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("engine.toml");

        fs::write(
            &path,
            r#"
[server]
bind_addr = "127.0.0.1:9100"

[server.api]
max_body_bytes = "1MB"
max_process_items = 500

[engine]
buffer_capacity = 64
auto_process_threshold = 32

[health]
failure_rate_threshold = 0.25
            "#,
        )
        .unwrap();

        let config = load_from_sources(path).unwrap();
        assert_eq!(config.server.bind_addr.port(), 9100);
        assert_eq!(config.server.api.max_body_bytes.as_u64(), 1024 * 1024);
        assert_eq!(config.server.api.max_process_items, 500);
        assert_eq!(config.engine.buffer_capacity, 64);
        assert_eq!(config.engine.auto_process_threshold, Some(32));
        assert!((config.health.failure_rate_threshold - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_explicit_path_is_used() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("explicit.toml");
        fs::write(&path, "[engine]\nprocess_batch_size = 7\n").unwrap();

        let config = load(Some(path)).unwrap();
        assert_eq!(config.engine.process_batch_size, 7);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.toml");
        fs::write(&path, "[engine\nbuffer_capacity = ").unwrap();

        assert!(load_from_sources(path).is_err());
    }
}
