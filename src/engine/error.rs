use thiserror::Error;

use super::entry::FieldError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid log payload: {0}")]
    Validation(#[from] FieldError),

    #[error("buffer capacity reached ({capacity} pending entries)")]
    Capacity { capacity: usize },

    #[error("log {id} failed processing: {reason}")]
    EntryProcessing { id: u64, reason: String },

    #[error("engine runtime is not initialized")]
    NotInitialized,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal engine fault: {0}")]
    Internal(String),
}

impl EngineError {
    /// Stable machine-readable code, independent of the message text.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "VALIDATION_ERROR",
            EngineError::Capacity { .. } => "CAPACITY_ERROR",
            EngineError::EntryProcessing { .. } => "ENTRY_PROCESSING_ERROR",
            EngineError::NotInitialized => "ENGINE_STATE_ERROR",
            EngineError::Serialization(_) => "SERIALIZATION_ERROR",
            EngineError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller can reasonably retry or fix the input.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::Validation(_)
                | EngineError::Capacity { .. }
                | EngineError::EntryProcessing { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::entry::Field;

    #[test]
    fn codes_are_stable() {
        assert_eq!(EngineError::NotInitialized.code(), "ENGINE_STATE_ERROR");
        assert_eq!(
            EngineError::Capacity { capacity: 4 }.code(),
            "CAPACITY_ERROR"
        );
        assert_eq!(
            EngineError::Internal("boom".into()).code(),
            "INTERNAL_ERROR"
        );
    }

    #[test]
    fn validation_message_names_the_field() {
        let err = EngineError::from(FieldError::Empty(Field::Level));
        assert_eq!(err.to_string(), "invalid log payload: level must not be empty");
        assert!(err.is_recoverable());
        assert!(!EngineError::NotInitialized.is_recoverable());
    }
}
