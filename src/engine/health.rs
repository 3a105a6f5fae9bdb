use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::error::{EngineError, Result};
use crate::config::HealthConfig;

/// Batches kept in the trailing window, regardless of its duration.
const MAX_WINDOW_BATCHES: usize = 256;

#[derive(Debug, Clone, Copy)]
struct BatchSample {
    at: Instant,
    processed: u64,
    failed: u64,
}

/// Bounded record of recent batch outcomes used for the failure rate.
#[derive(Debug)]
pub struct FailureWindow {
    samples: Mutex<VecDeque<BatchSample>>,
    window: Duration,
}

impl FailureWindow {
    pub fn new(window: Duration) -> Self {
        Self {
            samples: Mutex::new(VecDeque::with_capacity(MAX_WINDOW_BATCHES)),
            window,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, VecDeque<BatchSample>>> {
        self.samples
            .lock()
            .map_err(|_| EngineError::Internal("failure window lock poisoned".to_string()))
    }

    pub fn record(&self, processed: usize, failed: usize) -> Result<()> {
        if processed == 0 && failed == 0 {
            return Ok(());
        }

        let mut samples = self.lock()?;

        if samples.len() == MAX_WINDOW_BATCHES {
            samples.pop_front();
        }
        samples.push_back(BatchSample {
            at: Instant::now(),
            processed: processed as u64,
            failed: failed as u64,
        });
        Ok(())
    }

    #[cfg(test)]
    pub(super) fn poison(&self) {
        let samples = &self.samples;
        let _ = std::thread::scope(|scope| {
            scope
                .spawn(|| {
                    let _guard = samples.lock();
                    panic!("poisoning failure window");
                })
                .join()
        });
    }

    /// `(failed, total)` entry counts within the trailing window.
    pub fn totals(&self) -> Result<(u64, u64)> {
        let samples = self.lock()?;

        let now = Instant::now();
        Ok(samples
            .iter()
            .filter(|sample| now.duration_since(sample.at) <= self.window)
            .fold((0, 0), |(failed, total), sample| {
                (failed + sample.failed, total + sample.processed + sample.failed)
            }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    Ok,
    High,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthChecks {
    pub queue_depth: CheckState,
    pub failure_rate: CheckState,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub queue_depth: usize,
    pub failure_rate: f64,
    pub checks: HealthChecks,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Inputs read from a running engine for one health evaluation.
#[derive(Debug, Clone, Copy)]
pub struct HealthProbe {
    pub queue_depth: usize,
    pub window_failed: u64,
    pub window_total: u64,
}

/// Threshold-based status derivation. Holds no state of its own.
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    config: HealthConfig,
}

impl HealthMonitor {
    pub fn new(config: HealthConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HealthConfig {
        &self.config
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.config.failure_window_secs)
    }

    /// Report for an engine that is not running or hit a fatal fault.
    pub fn down(&self, reason: impl Into<String>) -> HealthReport {
        HealthReport {
            status: HealthStatus::Down,
            queue_depth: 0,
            failure_rate: 0.0,
            checks: HealthChecks {
                queue_depth: CheckState::Ok,
                failure_rate: CheckState::Ok,
            },
            error: Some(reason.into()),
        }
    }

    pub fn evaluate(&self, probe: HealthProbe) -> HealthReport {
        let failure_rate = if probe.window_total == 0 {
            0.0
        } else {
            probe.window_failed as f64 / probe.window_total as f64
        };

        let depth_check = if probe.queue_depth > self.config.queue_depth_threshold {
            CheckState::High
        } else {
            CheckState::Ok
        };

        // Too few samples make the rate meaningless
        let rate_check = if probe.window_total >= self.config.min_window_samples
            && failure_rate >= self.config.failure_rate_threshold
        {
            CheckState::High
        } else {
            CheckState::Ok
        };

        let status = if depth_check == CheckState::High || rate_check == CheckState::High {
            HealthStatus::Degraded
        } else {
            HealthStatus::Ok
        };

        HealthReport {
            status,
            queue_depth: probe.queue_depth,
            failure_rate,
            checks: HealthChecks {
                queue_depth: depth_check,
                failure_rate: rate_check,
            },
            error: None,
        }
    }
}
