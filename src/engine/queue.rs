use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use super::entry::{LogEntry, validate_submission};
use super::error::{EngineError, Result};

struct QueueInner {
    closed: bool,
    entries: VecDeque<LogEntry>,
    bytes: usize,
}

/// Bounded FIFO buffer of pending log entries.
///
/// Id assignment and append happen under the same lock, so queue order is
/// always ascending by id. The live depth and memory estimate are mirrored
/// into atomics so probes can read them without touching the lock.
///
/// Once [`LogQueue::close`] has run, every operation that reads or writes
/// entries fails with [`EngineError::NotInitialized`].
pub struct LogQueue {
    inner: Mutex<QueueInner>,
    /// Next id to hand out; may be shared with earlier, closed queues
    sequence: Arc<AtomicU64>,
    capacity: usize,
    depth: AtomicUsize,
    bytes: AtomicUsize,
}

impl LogQueue {
    pub fn new(capacity: usize) -> Self {
        Self::with_sequence(capacity, Arc::new(AtomicU64::new(1)))
    }

    /// Queue drawing ids from `sequence`, which holds the next id to assign.
    ///
    /// Ids are only taken while the queue lock is held and never after
    /// [`LogQueue::close`], so successive queues sharing one sequence keep
    /// ids unique and increasing.
    pub fn with_sequence(capacity: usize, sequence: Arc<AtomicU64>) -> Self {
        debug!(capacity, next_id = sequence.load(Ordering::SeqCst), "Creating log queue");

        Self {
            inner: Mutex::new(QueueInner {
                closed: false,
                entries: VecDeque::new(),
                bytes: 0,
            }),
            sequence,
            capacity,
            depth: AtomicUsize::new(0),
            bytes: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, QueueInner>> {
        self.inner
            .lock()
            .map_err(|_| EngineError::Internal("log queue lock poisoned".to_string()))
    }

    fn lock_open(&self) -> Result<MutexGuard<'_, QueueInner>> {
        let inner = self.lock()?;
        if inner.closed {
            return Err(EngineError::NotInitialized);
        }
        Ok(inner)
    }

    fn publish(&self, inner: &QueueInner) {
        self.depth.store(inner.entries.len(), Ordering::Release);
        self.bytes.store(inner.bytes, Ordering::Release);
    }

    /// Validate and append an entry, returning its sequence id.
    ///
    /// A full queue rejects the new entry; existing entries are never evicted.
    pub fn enqueue(&self, level: &str, source: &str, message: &str) -> Result<u64> {
        self.enqueue_with(level, source, message, || {})
    }

    /// Like [`LogQueue::enqueue`], running `on_accept` while the entry is
    /// being appended. A concurrent drain cannot observe the entry before
    /// `on_accept` has returned.
    pub fn enqueue_with(
        &self,
        level: &str,
        source: &str,
        message: &str,
        on_accept: impl FnOnce(),
    ) -> Result<u64> {
        validate_submission(level, source, message)?;

        let mut inner = self.lock_open()?;
        if inner.entries.len() >= self.capacity {
            return Err(EngineError::Capacity {
                capacity: self.capacity,
            });
        }

        let id = self.sequence.fetch_add(1, Ordering::SeqCst);

        let entry = LogEntry::pending(id, level, source, message);
        inner.bytes += entry.footprint();
        inner.entries.push_back(entry);
        on_accept();
        self.publish(&inner);

        Ok(id)
    }

    /// Copy of every pending entry, oldest first.
    pub fn peek_pending(&self) -> Result<Vec<LogEntry>> {
        self.peek_pending_limited(None)
    }

    /// Copy of up to `limit` pending entries, oldest first.
    pub fn peek_pending_limited(&self, limit: Option<usize>) -> Result<Vec<LogEntry>> {
        let inner = self.lock_open()?;
        let take = limit.unwrap_or(usize::MAX);
        Ok(inner.entries.iter().take(take).cloned().collect())
    }

    /// Remove and return up to `max_items` entries in id order.
    ///
    /// `max_items == 0` drains everything pending at the moment the lock is
    /// taken. An empty queue yields an empty vector.
    pub fn drain(&self, max_items: usize) -> Result<Vec<LogEntry>> {
        let mut inner = self.lock_open()?;

        let count = if max_items == 0 {
            inner.entries.len()
        } else {
            max_items.min(inner.entries.len())
        };

        let drained: Vec<LogEntry> = inner.entries.drain(..count).collect();
        let released: usize = drained.iter().map(LogEntry::footprint).sum();
        inner.bytes = inner.bytes.saturating_sub(released);
        self.publish(&inner);

        if !drained.is_empty() {
            debug!(count = drained.len(), remaining = inner.entries.len(), "Drained log queue");
        }

        Ok(drained)
    }

    /// Refuse further work and drop every pending entry.
    ///
    /// Closing twice is harmless; the second call discards nothing.
    pub fn close(&self) -> Result<usize> {
        let mut inner = self.lock()?;
        inner.closed = true;
        let discarded = inner.entries.len();
        inner.entries.clear();
        inner.bytes = 0;
        self.publish(&inner);
        Ok(discarded)
    }

    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::Acquire)
    }

    pub fn memory_bytes_estimate(&self) -> usize {
        self.bytes.load(Ordering::Acquire)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
