use thiserror::Error;

use super::models::{LogRequest, ProcessRequest};
use crate::engine::{FieldError, validate_submission};

#[derive(Debug, Error)]
pub enum RequestValidationError {
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error("max_items must be between 0 and {limit}, got {requested}")]
    MaxItemsOutOfRange { requested: usize, limit: usize },
}

/// Same bounds the engine enforces, checked before the engine is called
pub fn validate_log_request(request: &LogRequest) -> Result<(), RequestValidationError> {
    validate_submission(&request.level, &request.source, &request.message)?;
    Ok(())
}

pub fn validate_process_request(
    request: &ProcessRequest,
    limit: usize,
) -> Result<(), RequestValidationError> {
    if request.max_items > limit {
        return Err(RequestValidationError::MaxItemsOutOfRange {
            requested: request.max_items,
            limit,
        });
    }
    Ok(())
}
