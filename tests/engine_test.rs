use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use logengine::config::{EngineConfig, HealthConfig};
use logengine::engine::{
    BatchStatus, DefaultProcessor, Engine, EngineApi, EngineError, EntryError, EntryProcessor,
    EntryState, HealthStatus, LogEntry, NO_ERROR, NormalizedEntry,
};

fn engine_with(capacity: usize, depth_threshold: usize) -> Engine {
    let settings = EngineConfig {
        buffer_capacity: capacity,
        ..EngineConfig::default()
    };
    let health = HealthConfig {
        queue_depth_threshold: depth_threshold,
        ..HealthConfig::default()
    };
    let engine = Engine::new(settings, health);
    assert!(engine.init(), "engine init failed: {}", engine.last_error());
    engine
}

/// Fails entries whose message starts with `fail`, panics on `panic`
struct Picky;

impl EntryProcessor for Picky {
    fn process(&self, entry: &LogEntry) -> Result<NormalizedEntry, EntryError> {
        if entry.message.starts_with("panic") {
            panic!("processor bug");
        }
        if entry.message.starts_with("fail") {
            return Err(EntryError::Rejected(format!("refusing {}", entry.message)));
        }
        DefaultProcessor::new().process(entry)
    }
}

#[test]
fn test_fifo_order_on_full_drain() {
    let engine = engine_with(64, 1024);
    let ids: Vec<u64> = (0..20)
        .map(|i| engine.add_log("INFO", "api", &format!("msg {i}")).unwrap())
        .collect();

    let summary = engine.process_queue(0);
    let drained: Vec<u64> = summary.items.iter().map(|item| item.id).collect();

    assert_eq!(drained, ids);
    assert_eq!(summary.items[0].message, "msg 0");
    assert_eq!(summary.items[19].message, "msg 19");
}

#[test]
fn test_partial_batch_isolation() {
    let engine = Engine::with_processor(
        EngineConfig::default(),
        HealthConfig::default(),
        Arc::new(Picky),
    );
    assert!(engine.init());

    for message in ["one", "two", "fail three", "four", "five"] {
        engine.add_log("INFO", "api", message).unwrap();
    }

    let summary = engine.process_queue(0);
    assert_eq!(summary.status, BatchStatus::Partial);
    assert_eq!(summary.processed_count, 4);
    assert_eq!(summary.failed_count, 1);

    for item in &summary.items {
        let expected = if item.id == 3 {
            EntryState::Failed
        } else {
            EntryState::Processed
        };
        assert_eq!(item.state, expected, "entry {}", item.id);
    }
    assert_eq!(
        engine.last_error(),
        "log 3 failed processing: rejected: refusing fail three"
    );
}

#[test]
fn test_panicking_processor_fails_only_that_entry() {
    let engine = Engine::with_processor(
        EngineConfig::default(),
        HealthConfig::default(),
        Arc::new(Picky),
    );
    assert!(engine.init());

    engine.add_log("INFO", "api", "before").unwrap();
    engine.add_log("INFO", "api", "panic now").unwrap();
    engine.add_log("INFO", "api", "after").unwrap();

    let summary = engine.process_queue(0);
    assert_eq!(summary.processed_count, 2);
    assert_eq!(summary.failed_count, 1);
    assert_eq!(summary.items[1].error.as_deref(), Some("processor panicked"));

    // The engine keeps working afterwards
    assert_eq!(engine.health().status, HealthStatus::Ok);
    engine.add_log("INFO", "api", "still alive").unwrap();
}

#[test]
fn test_capacity_enforcement() {
    let capacity = 8;
    let engine = engine_with(capacity, 1024);

    for i in 0..capacity {
        engine.add_log("INFO", "api", &format!("m{i}")).unwrap();
    }

    let err = engine.add_log("INFO", "api", "one too many").unwrap_err();
    assert!(matches!(err, EngineError::Capacity { capacity: 8 }));
    assert_eq!(err.code(), "CAPACITY_ERROR");

    let pending = engine.pending_logs().unwrap();
    assert_eq!(pending.queue_depth, capacity);
    assert!(pending.items.iter().all(|item| item.message != "one too many"));
}

#[test]
fn test_idempotent_lifecycle() {
    let engine = engine_with(16, 1024);
    engine.add_log("INFO", "api", "kept").unwrap();

    assert!(engine.init());
    assert_eq!(engine.metrics().unwrap().received_total, 1);

    assert!(engine.shutdown());
    assert!(engine.shutdown());
    assert!(matches!(
        engine.add_log("INFO", "api", "late").unwrap_err(),
        EngineError::NotInitialized
    ));
    assert!(engine.process_queue(0).is_error());
    assert_eq!(engine.health().status, HealthStatus::Down);

    assert!(engine.init());
    assert_eq!(engine.metrics().unwrap().received_total, 0);
    assert_eq!(engine.last_error(), NO_ERROR);
}

#[test]
fn test_ids_keep_increasing_across_restart() {
    let engine = engine_with(16, 1024);
    let before = engine.add_log("INFO", "api", "first run").unwrap();
    engine.add_log("INFO", "api", "discarded").unwrap();

    assert!(engine.shutdown());
    assert!(engine.init());

    let after = engine.add_log("INFO", "api", "second run").unwrap();
    assert!(after > before + 1, "id {after} reused after restart");
    assert_eq!(engine.pending_logs().unwrap().items[0].id, after);
}

#[test]
fn test_shutdown_races_with_producers() {
    let engine = Arc::new(engine_with(100_000, 100_000));

    let producers: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let mut accepted = Vec::new();
                for i in 0..2000 {
                    match engine.add_log("INFO", "api", &format!("m{i}")) {
                        Ok(id) => accepted.push(id),
                        Err(err) => {
                            assert!(matches!(err, EngineError::NotInitialized));
                            break;
                        }
                    }
                }
                accepted
            })
        })
        .collect();

    assert!(engine.shutdown());
    let mut accepted: Vec<u64> = producers
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect();

    // Nothing is accepted once shutdown has returned
    assert!(engine.add_log("INFO", "api", "late").is_err());

    assert!(engine.init());
    let next = engine.add_log("INFO", "api", "fresh").unwrap();
    let accepted_count = accepted.len();
    accepted.sort_unstable();
    accepted.dedup();
    assert_eq!(accepted.len(), accepted_count);
    assert!(accepted.iter().all(|id| *id < next));
}

#[test]
fn test_metrics_monotonic_under_concurrency() {
    let engine = Arc::new(engine_with(100_000, 100_000));
    let done = Arc::new(AtomicBool::new(false));

    let producers: Vec<_> = (0..4)
        .map(|p| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for i in 0..1000 {
                    let message = if i % 10 == 0 { " ".to_string() } else { format!("m{i}") };
                    engine.add_log("INFO", &format!("producer-{p}"), &message).unwrap();
                }
            })
        })
        .collect();

    let processor = {
        let engine = Arc::clone(&engine);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            while !done.load(Ordering::Acquire) {
                let summary = engine.process_queue(50);
                assert!(!summary.is_error());
            }
        })
    };

    let observer = {
        let engine = Arc::clone(&engine);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut last = (0, 0);
            while !done.load(Ordering::Acquire) {
                let snapshot = engine.metrics().unwrap();
                let finished = snapshot.processed_total + snapshot.failed_total;

                assert!(snapshot.received_total >= finished);
                assert!(snapshot.received_total >= last.0);
                assert!(finished >= last.1);
                last = (snapshot.received_total, finished);
            }
        })
    };

    for handle in producers {
        handle.join().unwrap();
    }
    done.store(true, Ordering::Release);
    processor.join().unwrap();
    observer.join().unwrap();

    engine.process_queue(0);
    let snapshot = engine.metrics().unwrap();
    assert_eq!(snapshot.received_total, 4000);
    assert_eq!(snapshot.processed_total, 3600);
    assert_eq!(snapshot.failed_total, 400);
    assert_eq!(snapshot.queue_depth, 0);
}

#[test]
fn test_health_flips_with_queue_depth() {
    let threshold = 5;
    let engine = engine_with(64, threshold);

    for i in 0..threshold {
        engine.add_log("INFO", "api", &format!("m{i}")).unwrap();
    }
    assert_eq!(engine.health().status, HealthStatus::Ok);

    engine.add_log("INFO", "api", "tipping point").unwrap();
    let report = engine.health();
    assert_eq!(report.status, HealthStatus::Degraded);
    assert_eq!(report.queue_depth, threshold + 1);

    engine.process_queue(3);
    assert_eq!(engine.health().status, HealthStatus::Ok);
}

#[test]
fn test_health_flips_with_failure_rate() {
    let settings = EngineConfig::default();
    let health = HealthConfig {
        failure_rate_threshold: 0.5,
        min_window_samples: 4,
        ..HealthConfig::default()
    };
    let engine = Engine::new(settings, health);
    assert!(engine.init());

    for _ in 0..4 {
        engine.add_log("INFO", "api", " ").unwrap();
    }
    engine.process_queue(0);

    let report = engine.health();
    assert_eq!(report.status, HealthStatus::Degraded);
    assert!((report.failure_rate - 1.0).abs() < f64::EPSILON);
}

#[test]
fn test_empty_queue_processing() {
    let engine = engine_with(4, 1024);
    let summary = engine.process_queue(0);

    assert_eq!(summary.status, BatchStatus::Ok);
    assert_eq!(summary.processed_count, 0);
    assert_eq!(summary.failed_count, 0);
    assert!(summary.error.is_none());
}

#[test]
fn test_validation_boundaries() {
    let engine = engine_with(8, 1024);

    assert!(engine.add_log("INFO", "api", &"m".repeat(511)).is_ok());
    assert!(matches!(
        engine.add_log("INFO", "api", &"m".repeat(512)).unwrap_err(),
        EngineError::Validation(_)
    ));
    assert!(matches!(
        engine.add_log("", "api", "hello").unwrap_err(),
        EngineError::Validation(_)
    ));
    assert_eq!(engine.pending_logs().unwrap().queue_depth, 1);
}

#[test]
fn test_contract_uses_message_then_source() {
    let engine = Arc::new(engine_with(8, 1024));
    let api = EngineApi::new(Arc::clone(&engine));

    assert!(api.add_log("DEBUG", "cache warmed", "worker-7"));
    let entry = &engine.pending_logs().unwrap().items[0];
    assert_eq!(entry.source, "worker-7");
    assert_eq!(entry.message, "cache warmed");
}
