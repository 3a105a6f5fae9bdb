//! The log processing engine.
//!
//! One [`Engine`] owns the queue, metrics and error state for its lifetime.
//! It is constructed once at process start and shared by handle (`Arc`) with
//! every caller; there is no module-level singleton.
//!
//! ## Lifecycle
//!
//! - [`Engine::init`] allocates the runtime (queue, metrics, failure window).
//!   Calling it again while running is a no-op that reports success.
//! - [`Engine::shutdown`] closes the queue and releases the runtime. Pending
//!   entries are discarded, not processed. Calling it again is a no-op that
//!   reports success.
//! - Every other operation fails fast with [`EngineError::NotInitialized`]
//!   while no runtime exists, including callers that raced `shutdown` and
//!   still hold the released runtime.
//! - Entry ids come from one sequence owned by the engine, so they stay
//!   unique and increasing across `shutdown`/`init` cycles.
//!
//! ## Locking
//!
//! The queue, the metrics counters and the error state are synchronized
//! independently. The runtime slot itself is only locked long enough to clone
//! an `Arc`, so an in-flight batch never blocks enqueues and vice versa.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use logengine::engine::Engine;
//!
//! let engine = Engine::new(config.engine.clone(), config.health.clone());
//! engine.init();
//! engine.add_log("INFO", "api", "user logged in")?;
//! let summary = engine.process_queue(0);
//! ```

mod contract;
mod entry;
mod error;
mod health;
mod last_error;
mod pipeline;
mod queue;

pub use contract::EngineApi;
pub use entry::{
    EntryState, Field, FieldError, LogEntry, MAX_LEVEL_CHARS, MAX_MESSAGE_CHARS,
    MAX_SOURCE_CHARS, validate_submission,
};
pub use error::{EngineError, Result};
pub use health::{
    CheckState, FailureWindow, HealthChecks, HealthMonitor, HealthProbe, HealthReport,
    HealthStatus,
};
pub use last_error::{ErrorState, NO_ERROR};
pub use pipeline::{
    BatchStatus, DefaultProcessor, EntryError, EntryProcessor, NormalizedEntry, Pipeline,
    ProcessSummary, ProcessedItem, Severity,
};
pub use queue::LogQueue;

use serde::Serialize;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, OnceLock, RwLock};
use tracing::{debug, error, info, warn};

use crate::config::{self, Config, EngineConfig, HealthConfig};
use crate::observability::{Metrics, MetricsSnapshot};

/// Snapshot returned by `get_pending_logs`
#[derive(Debug, Clone, Serialize)]
pub struct PendingLogs {
    pub queue_depth: usize,
    pub returned: usize,
    pub items: Vec<LogEntry>,
}

/// State allocated by `init` and released by `shutdown`.
struct Runtime {
    queue: LogQueue,
    metrics: Metrics,
    failures: FailureWindow,
    fault: OnceLock<String>,
}

impl Runtime {
    fn mark_fault(&self, err: &EngineError) {
        if let EngineError::Internal(reason) = err {
            if self.fault.set(reason.clone()).is_ok() {
                error!(reason = %reason, "Engine entered fatal fault state");
            }
        }
    }
}

pub struct Engine {
    settings: EngineConfig,
    monitor: HealthMonitor,
    pipeline: Pipeline,
    runtime: RwLock<Option<Arc<Runtime>>>,
    errors: ErrorState,
    next_id: Arc<AtomicU64>,
}

impl Engine {
    pub fn new(settings: EngineConfig, health: HealthConfig) -> Self {
        Self::with_processor(settings, health, Arc::new(DefaultProcessor::new()))
    }

    pub fn with_processor(
        settings: EngineConfig,
        health: HealthConfig,
        processor: Arc<dyn EntryProcessor>,
    ) -> Self {
        Self {
            settings,
            monitor: HealthMonitor::new(health),
            pipeline: Pipeline::new(processor),
            runtime: RwLock::new(None),
            errors: ErrorState::new(),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.engine.clone(), config.health.clone())
    }

    pub fn settings(&self) -> &EngineConfig {
        &self.settings
    }

    pub fn errors(&self) -> &ErrorState {
        &self.errors
    }

    /// Record `err` into the error state and hand it back for propagation.
    fn report(&self, component: &str, err: EngineError) -> EngineError {
        self.errors.record(component, err.to_string());
        err
    }

    fn runtime(&self) -> Result<Arc<Runtime>> {
        let slot = self
            .runtime
            .read()
            .map_err(|_| EngineError::Internal("engine runtime lock poisoned".to_string()))?;
        slot.as_ref().cloned().ok_or(EngineError::NotInitialized)
    }

    /// Allocate the runtime. Returns `false` and records the reason on failure.
    pub fn init(&self) -> bool {
        let mut slot = match self.runtime.write() {
            Ok(slot) => slot,
            Err(_) => {
                self.errors
                    .record("lifecycle", "engine runtime lock poisoned");
                return false;
            }
        };

        if slot.is_some() {
            debug!("Engine already initialized");
            return true;
        }

        if let Err(err) = config::validate_engine(&self.settings, self.monitor.config()) {
            self.errors.record("lifecycle", err.to_string());
            return false;
        }

        *slot = Some(Arc::new(Runtime {
            queue: LogQueue::with_sequence(
                self.settings.buffer_capacity,
                Arc::clone(&self.next_id),
            ),
            metrics: Metrics::new(),
            failures: FailureWindow::new(self.monitor.window()),
            fault: OnceLock::new(),
        }));
        self.errors.clear();

        info!(
            capacity = self.settings.buffer_capacity,
            batch_size = self.settings.process_batch_size,
            "Engine runtime initialized"
        );
        true
    }

    /// Release the runtime. Pending entries are discarded.
    pub fn shutdown(&self) -> bool {
        let mut slot = match self.runtime.write() {
            Ok(slot) => slot,
            Err(_) => {
                self.errors
                    .record("lifecycle", "engine runtime lock poisoned");
                return false;
            }
        };

        let Some(runtime) = slot.take() else {
            debug!("Engine already shut down");
            return true;
        };

        match runtime.queue.close() {
            Ok(0) => {}
            Ok(discarded) => warn!(discarded, "Pending entries discarded at shutdown"),
            Err(err) => {
                self.report("lifecycle", err);
                return false;
            }
        }

        info!("Engine runtime shutdown completed");
        true
    }

    pub fn is_initialized(&self) -> bool {
        self.runtime().is_ok()
    }

    /// Enqueue one entry, returning its sequence id.
    pub fn add_log(&self, level: &str, source: &str, message: &str) -> Result<u64> {
        let runtime = self.runtime().map_err(|err| self.report("queue", err))?;

        let id = runtime
            .queue
            .enqueue_with(level, source, message, || runtime.metrics.record_received())
            .map_err(|err| {
                runtime.metrics.record_rejected();
                runtime.mark_fault(&err);
                self.report("queue", err)
            })?;

        debug!(id, level, source, "Log enqueued");

        if let Some(threshold) = self.settings.auto_process_threshold {
            if runtime.queue.depth() >= threshold {
                debug!(threshold, "Auto-process threshold reached");
                self.run_batch(&runtime, self.settings.process_batch_size);
            }
        }

        Ok(id)
    }

    pub fn pending_logs(&self) -> Result<PendingLogs> {
        let runtime = self.runtime().map_err(|err| self.report("queue", err))?;

        let items = runtime
            .queue
            .peek_pending_limited(self.settings.pending_preview_limit)
            .map_err(|err| {
                runtime.mark_fault(&err);
                self.report("queue", err)
            })?;

        Ok(PendingLogs {
            queue_depth: runtime.queue.depth(),
            returned: items.len(),
            items,
        })
    }

    /// Process up to `max_items` pending entries (`0` means all).
    ///
    /// Never fails: engine-level failures come back as a summary with
    /// [`BatchStatus::Error`] and the reason recorded in the error state.
    pub fn process_queue(&self, max_items: usize) -> ProcessSummary {
        match self.runtime() {
            Ok(runtime) => self.run_batch(&runtime, max_items),
            Err(err) => ProcessSummary::engine_error(self.report("pipeline", err).to_string()),
        }
    }

    fn run_batch(&self, runtime: &Runtime, max_items: usize) -> ProcessSummary {
        match self
            .pipeline
            .run(&runtime.queue, &runtime.metrics, &self.errors, max_items)
        {
            Ok(summary) => {
                if let Err(err) = runtime
                    .failures
                    .record(summary.processed_count, summary.failed_count)
                {
                    runtime.mark_fault(&err);
                    self.report("health", err);
                    return summary;
                }
                if summary.status == BatchStatus::Ok && summary.processed_count > 0 {
                    self.errors.clear();
                }
                summary
            }
            Err(err) => {
                runtime.mark_fault(&err);
                ProcessSummary::engine_error(self.report("pipeline", err).to_string())
            }
        }
    }

    pub fn metrics(&self) -> Result<MetricsSnapshot> {
        let runtime = self.runtime().map_err(|err| self.report("metrics", err))?;
        Ok(runtime.metrics.snapshot(&runtime.queue))
    }

    /// Derive the current health status.
    ///
    /// Never writes the error state. A poisoned failure window marks the
    /// engine faulted and reports `down`.
    pub fn health(&self) -> HealthReport {
        let runtime = match self.runtime() {
            Ok(runtime) => runtime,
            Err(err) => return self.monitor.down(err.to_string()),
        };

        if let Some(reason) = runtime.fault.get() {
            return self.monitor.down(format!("fatal engine fault: {reason}"));
        }

        let (window_failed, window_total) = match runtime.failures.totals() {
            Ok(totals) => totals,
            Err(err) => {
                runtime.mark_fault(&err);
                return self.monitor.down(format!("fatal engine fault: {err}"));
            }
        };
        self.monitor.evaluate(HealthProbe {
            queue_depth: runtime.queue.depth(),
            window_failed,
            window_total,
        })
    }

    /// Most recent error message, or [`NO_ERROR`].
    pub fn last_error(&self) -> String {
        self.errors.describe()
    }
}
