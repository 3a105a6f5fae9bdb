//! Batch processing of drained log entries.
//!
//! The pipeline drains a batch from the [`LogQueue`], hands each entry to an
//! [`EntryProcessor`] and folds the outcomes into a [`ProcessSummary`]. One
//! failing entry never aborts the batch: it is marked `Failed`, counted and
//! reported, and the remaining entries are still processed.
//!
//! ## Default processing
//!
//! [`DefaultProcessor`] normalizes and classifies entries:
//! - trims surrounding whitespace from level, source and message
//! - rejects fields that are blank after trimming
//! - rejects control characters other than tab and line breaks
//! - classifies the level into a [`Severity`] bucket, keeping the submitted
//!   spelling (unknown levels are accepted as [`Severity::Unknown`])

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

use super::entry::{EntryState, Field, LogEntry};
use super::error::{EngineError, Result};
use super::last_error::ErrorState;
use super::queue::LogQueue;
use crate::observability::Metrics;

/// Per-entry processing failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error("{0} is blank after normalization")]
    Blank(Field),
    #[error("{0} contains control characters")]
    ControlCharacter(Field),
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("processor panicked")]
    Panicked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Unknown,
}

impl Severity {
    /// Classify a free-form level string, ignoring case.
    pub fn classify(level: &str) -> Self {
        match level.to_ascii_uppercase().as_str() {
            "TRACE" => Severity::Trace,
            "DEBUG" | "DBG" => Severity::Debug,
            "INFO" | "INFORMATION" | "NOTICE" => Severity::Info,
            "WARN" | "WARNING" => Severity::Warn,
            "ERROR" | "ERR" => Severity::Error,
            "FATAL" | "CRITICAL" | "CRIT" | "PANIC" | "ALERT" | "EMERG" => Severity::Fatal,
            _ => Severity::Unknown,
        }
    }
}

/// Normalized form of an entry produced by a processor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEntry {
    pub level: String,
    pub source: String,
    pub message: String,
    pub severity: Severity,
}

/// Transformation applied to every drained entry.
///
/// Implementations must be cheap and must not block on external resources;
/// a batch runs to completion on the caller's thread.
pub trait EntryProcessor: Send + Sync {
    fn process(&self, entry: &LogEntry) -> std::result::Result<NormalizedEntry, EntryError>;
}

/// Built-in trimming and classification processor
#[derive(Debug, Clone, Default)]
pub struct DefaultProcessor;

impl DefaultProcessor {
    pub fn new() -> Self {
        Self
    }

    fn normalize(field: Field, value: &str) -> std::result::Result<String, EntryError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(EntryError::Blank(field));
        }

        if trimmed
            .chars()
            .any(|c| c.is_control() && !matches!(c, '\t' | '\n' | '\r'))
        {
            return Err(EntryError::ControlCharacter(field));
        }

        Ok(trimmed.to_string())
    }
}

impl EntryProcessor for DefaultProcessor {
    fn process(&self, entry: &LogEntry) -> std::result::Result<NormalizedEntry, EntryError> {
        let level = Self::normalize(Field::Level, &entry.level)?;
        let source = Self::normalize(Field::Source, &entry.source)?;
        let message = Self::normalize(Field::Message, &entry.message)?;
        let severity = Severity::classify(&level);

        Ok(NormalizedEntry {
            level,
            source,
            message,
            severity,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Ok,
    Partial,
    Error,
}

/// Outcome of one entry within a batch.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedItem {
    pub id: u64,
    pub level: String,
    pub source: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    pub enqueued_at: DateTime<Utc>,
    pub processed_at: DateTime<Utc>,
    pub latency_ms: i64,
    pub state: EntryState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessedItem {
    fn processed(entry: LogEntry, normalized: NormalizedEntry, processed_at: DateTime<Utc>) -> Self {
        Self {
            id: entry.id,
            level: normalized.level,
            source: normalized.source,
            message: normalized.message,
            severity: Some(normalized.severity),
            latency_ms: (processed_at - entry.enqueued_at).num_milliseconds(),
            enqueued_at: entry.enqueued_at,
            processed_at,
            state: EntryState::Processed,
            error: None,
        }
    }

    fn failed(entry: LogEntry, error: &EntryError, processed_at: DateTime<Utc>) -> Self {
        Self {
            id: entry.id,
            latency_ms: (processed_at - entry.enqueued_at).num_milliseconds(),
            level: entry.level,
            source: entry.source,
            message: entry.message,
            severity: None,
            enqueued_at: entry.enqueued_at,
            processed_at,
            state: EntryState::Failed,
            error: Some(error.to_string()),
        }
    }
}

/// Result of one `process_queue` call.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessSummary {
    pub status: BatchStatus,
    pub processed_count: usize,
    pub failed_count: usize,
    pub elapsed_ms: f64,
    pub items: Vec<ProcessedItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessSummary {
    /// Summary for a batch that could not run at all.
    pub fn engine_error(reason: impl Into<String>) -> Self {
        Self {
            status: BatchStatus::Error,
            processed_count: 0,
            failed_count: 0,
            elapsed_ms: 0.0,
            items: Vec::new(),
            error: Some(reason.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == BatchStatus::Error
    }
}

/// Drains the queue in batches and applies the configured processor.
#[derive(Clone)]
pub struct Pipeline {
    processor: Arc<dyn EntryProcessor>,
}

impl Pipeline {
    pub fn new(processor: Arc<dyn EntryProcessor>) -> Self {
        Self { processor }
    }

    /// Process up to `max_items` pending entries (`0` means all).
    ///
    /// Only queue-level failures are returned as errors; entry failures are
    /// reported inside the summary and recorded into `errors`.
    pub fn run(
        &self,
        queue: &LogQueue,
        metrics: &Metrics,
        errors: &ErrorState,
        max_items: usize,
    ) -> Result<ProcessSummary> {
        let started = Instant::now();
        let batch = queue.drain(max_items)?;

        if batch.is_empty() {
            return Ok(ProcessSummary {
                status: BatchStatus::Ok,
                processed_count: 0,
                failed_count: 0,
                elapsed_ms: 0.0,
                items: Vec::new(),
                error: None,
            });
        }

        let mut items = Vec::with_capacity(batch.len());
        let mut processed_count = 0;
        let mut failed_count = 0;

        for entry in batch {
            let outcome = catch_unwind(AssertUnwindSafe(|| self.processor.process(&entry)))
                .unwrap_or(Err(EntryError::Panicked));
            let processed_at = Utc::now();

            match outcome {
                Ok(normalized) => {
                    metrics.record_processed();
                    processed_count += 1;
                    items.push(ProcessedItem::processed(entry, normalized, processed_at));
                }
                Err(err) => {
                    metrics.record_failed();
                    failed_count += 1;

                    let report = EngineError::EntryProcessing {
                        id: entry.id,
                        reason: err.to_string(),
                    };
                    errors.record("pipeline", report.to_string());
                    items.push(ProcessedItem::failed(entry, &err, processed_at));
                }
            }
        }

        let elapsed = started.elapsed();
        metrics.record_batch(elapsed);

        let status = if failed_count > 0 {
            BatchStatus::Partial
        } else {
            BatchStatus::Ok
        };

        info!(
            processed = processed_count,
            failed = failed_count,
            elapsed_us = elapsed.as_micros() as u64,
            "Batch processed"
        );
        debug!(remaining = queue.depth(), "Queue depth after batch");

        Ok(ProcessSummary {
            status,
            processed_count,
            failed_count,
            elapsed_ms: elapsed.as_secs_f64() * 1000.0,
            items,
            error: None,
        })
    }
}
