use super::models::{Config, EngineConfig, HealthConfig};
use thiserror::Error;

/// Largest request body the façade may be configured to accept
const MAX_BODY_LIMIT: u64 = 5 * 1024 * 1024; // 5 MB

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("engine.buffer_capacity must be positive")]
    ZeroBufferCapacity,

    #[error("engine.process_batch_size must be positive")]
    ZeroBatchSize,

    #[error("engine.auto_process_threshold ({threshold}) must be between 1 and buffer_capacity ({capacity})")]
    InvalidAutoProcessThreshold { threshold: usize, capacity: usize },

    #[error("health.queue_depth_threshold must be positive")]
    ZeroQueueDepthThreshold,

    #[error("health.failure_rate_threshold ({value}) must be in (0, 1]")]
    InvalidFailureRateThreshold { value: f64 },

    #[error("health.failure_window_secs must be positive")]
    ZeroFailureWindow,

    #[error("server.api.max_body_bytes ({actual}) exceeds limit of 5MB ({limit})")]
    BodyLimitExceeded { actual: u64, limit: u64 },

    #[error("server.api.max_process_items must be positive")]
    ZeroMaxProcessItems,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_engine(&config.engine, &config.health)?;
    validate_server(config)?;
    Ok(())
}

/// Checks an engine needs before it can allocate its runtime
pub fn validate_engine(engine: &EngineConfig, health: &HealthConfig) -> Result<(), ValidationError> {
    if engine.buffer_capacity == 0 {
        return Err(ValidationError::ZeroBufferCapacity);
    }

    if engine.process_batch_size == 0 {
        return Err(ValidationError::ZeroBatchSize);
    }

    if let Some(threshold) = engine.auto_process_threshold {
        if threshold == 0 || threshold > engine.buffer_capacity {
            return Err(ValidationError::InvalidAutoProcessThreshold {
                threshold,
                capacity: engine.buffer_capacity,
            });
        }
    }

    if health.queue_depth_threshold == 0 {
        return Err(ValidationError::ZeroQueueDepthThreshold);
    }

    // NaN fails both comparisons
    let rate = health.failure_rate_threshold;
    if !(rate > 0.0 && rate <= 1.0) {
        return Err(ValidationError::InvalidFailureRateThreshold { value: rate });
    }

    if health.failure_window_secs == 0 {
        return Err(ValidationError::ZeroFailureWindow);
    }

    Ok(())
}

fn validate_server(config: &Config) -> Result<(), ValidationError> {
    let body_limit = config.server.api.max_body_bytes.as_u64();
    if body_limit > MAX_BODY_LIMIT {
        return Err(ValidationError::BodyLimitExceeded {
            actual: body_limit,
            limit: MAX_BODY_LIMIT,
        });
    }

    if config.server.api.max_process_items == 0 {
        return Err(ValidationError::ZeroMaxProcessItems);
    }

    Ok(())
}
