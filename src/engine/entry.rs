//! Log entry model and submission bounds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const MAX_LEVEL_CHARS: usize = 15;
pub const MAX_SOURCE_CHARS: usize = 63;
pub const MAX_MESSAGE_CHARS: usize = 511;

/// Submitted field, used to report which bound was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Level,
    Source,
    Message,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Level => "level",
            Field::Source => "source",
            Field::Message => "message",
        }
    }

    pub fn max_chars(&self) -> usize {
        match self {
            Field::Level => MAX_LEVEL_CHARS,
            Field::Source => MAX_SOURCE_CHARS,
            Field::Message => MAX_MESSAGE_CHARS,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{0} must not be empty")]
    Empty(Field),

    #[error("{field} exceeds {max} characters ({actual})")]
    TooLong {
        field: Field,
        max: usize,
        actual: usize,
    },
}

/// Check a single field against its character bounds.
///
/// Bounds count Unicode scalar values, not bytes, so a multi-byte message of
/// 511 characters is accepted.
pub fn check_field(field: Field, value: &str) -> Result<(), FieldError> {
    if value.is_empty() {
        return Err(FieldError::Empty(field));
    }

    let max = field.max_chars();
    let actual = value.chars().count();
    if actual > max {
        return Err(FieldError::TooLong { field, max, actual });
    }

    Ok(())
}

/// Validate a submission before it is allowed into the queue.
pub fn validate_submission(level: &str, source: &str, message: &str) -> Result<(), FieldError> {
    check_field(Field::Level, level)?;
    check_field(Field::Source, source)?;
    check_field(Field::Message, message)?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    Pending,
    Processed,
    Failed,
}

impl EntryState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EntryState::Pending)
    }
}

/// One submitted log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    pub level: String,
    pub source: String,
    pub message: String,
    pub enqueued_at: DateTime<Utc>,
    pub state: EntryState,
}

impl LogEntry {
    pub(crate) fn pending(id: u64, level: &str, source: &str, message: &str) -> Self {
        Self {
            id,
            level: level.to_string(),
            source: source.to_string(),
            message: message.to_string(),
            enqueued_at: Utc::now(),
            state: EntryState::Pending,
        }
    }

    /// Rough in-memory footprint, used for the buffer memory estimate.
    pub fn footprint(&self) -> usize {
        std::mem::size_of::<Self>() + self.level.len() + self.source.len() + self.message.len()
    }
}
