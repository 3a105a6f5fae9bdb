//! Flat operation set exposed to façades.
//!
//! Mirrors the engine's stable contract: lifecycle calls return a success
//! flag, queries return a UTF-8 JSON object, and failures are always an
//! explicit `{"error": ...}` or `{"status": "error", ...}` object. The
//! detailed reason of a failed call is available from `last_error`.

use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use super::Engine;
use super::error::EngineError;

#[derive(Clone)]
pub struct EngineApi {
    engine: Arc<Engine>,
}

impl EngineApi {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    pub fn init(&self) -> bool {
        self.engine.init()
    }

    pub fn shutdown(&self) -> bool {
        self.engine.shutdown()
    }

    /// Note the argument order: message before source.
    pub fn add_log(&self, level: &str, message: &str, source: &str) -> bool {
        self.engine.add_log(level, source, message).is_ok()
    }

    pub fn get_pending_logs(&self) -> String {
        match self.engine.pending_logs() {
            Ok(pending) => self.render(&pending),
            Err(err) => error_object(&err),
        }
    }

    pub fn process_queue(&self, max_items: usize) -> String {
        let summary = self.engine.process_queue(max_items);
        self.render(&summary)
    }

    pub fn get_metrics(&self) -> String {
        match self.engine.metrics() {
            Ok(snapshot) => self.render(&snapshot),
            Err(err) => error_object(&err),
        }
    }

    pub fn health(&self) -> String {
        let report = self.engine.health();
        self.render(&report)
    }

    pub fn last_error(&self) -> String {
        self.engine.last_error()
    }

    fn render<T: Serialize>(&self, value: &T) -> String {
        match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(err) => {
                let err = EngineError::from(err);
                self.engine.errors().record("contract", err.to_string());
                json!({ "status": "error", "error": err.to_string() }).to_string()
            }
        }
    }
}

fn error_object(err: &EngineError) -> String {
    json!({ "error": err.to_string() }).to_string()
}
