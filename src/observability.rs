//! Observability: the engine metrics registry and tracing setup

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::{LogFormat, TelemetryConfig};
use crate::engine::LogQueue;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Events go to
/// stderr so console payloads on stdout stay machine-readable.
pub fn init_tracing(config: &TelemetryConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };

    if let Err(err) = result {
        eprintln!("tracing subscriber already installed: {err}");
    }
}

/// Operational counters for one engine lifetime.
///
/// Every counter is an independent atomic; concurrent updates are never lost
/// but a snapshot is only consistent field by field.
#[derive(Debug)]
pub struct Metrics {
    received: AtomicU64,
    processed: AtomicU64,
    failed: AtomicU64,
    rejected: AtomicU64,
    batches: AtomicU64,
    last_process_micros: AtomicU64,
    last_processed_at_ms: AtomicI64,
    started_at: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            received: AtomicU64::new(0),
            processed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            batches: AtomicU64::new(0),
            last_process_micros: AtomicU64::new(0),
            last_processed_at_ms: AtomicI64::new(0),
            started_at: Instant::now(),
        }
    }

    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(counter = "received_total", "Metric incremented");
    }

    pub fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(counter = "processed_total", "Metric incremented");
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(counter = "failed_total", "Metric incremented");
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "rejected_total", "Metric incremented");
    }

    /// Record the wall-clock duration of a finished processing batch.
    pub fn record_batch(&self, duration: Duration) {
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.last_process_micros.store(micros, Ordering::Relaxed);
        self.last_processed_at_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
        tracing::debug!(duration_us = micros, "Batch duration recorded");
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Point-in-time view of the counters plus the queue's live gauges.
    ///
    /// Outcome counters are read before `received_total`, so a snapshot never
    /// shows more finished entries than received ones.
    pub fn snapshot(&self, queue: &LogQueue) -> MetricsSnapshot {
        let processed_total = self.processed.load(Ordering::SeqCst);
        let failed_total = self.failed.load(Ordering::SeqCst);
        let received_total = self.received.load(Ordering::SeqCst);

        let last_ms = self.last_processed_at_ms.load(Ordering::Relaxed);
        let last_processed_at = if last_ms > 0 {
            Utc.timestamp_millis_opt(last_ms).single()
        } else {
            None
        };

        MetricsSnapshot {
            received_total,
            processed_total,
            failed_total,
            rejected_total: self.rejected.load(Ordering::Relaxed),
            batches_total: self.batches.load(Ordering::Relaxed),
            queue_depth: queue.depth(),
            buffer_capacity: queue.capacity(),
            memory_bytes_estimate: queue.memory_bytes_estimate(),
            last_process_duration_ms: self.last_process_micros.load(Ordering::Relaxed) as f64
                / 1000.0,
            last_processed_at,
            uptime_seconds: self.uptime().as_secs_f64(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub received_total: u64,
    pub processed_total: u64,
    pub failed_total: u64,
    pub rejected_total: u64,
    pub batches_total: u64,
    pub queue_depth: usize,
    pub buffer_capacity: usize,
    pub memory_bytes_estimate: usize,
    pub last_process_duration_ms: f64,
    pub last_processed_at: Option<DateTime<Utc>>,
    pub uptime_seconds: f64,
}
