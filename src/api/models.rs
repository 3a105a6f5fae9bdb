//! Request and response bodies of the HTTP façade.
//!
//! Query endpoints pass the engine's JSON payloads through untouched, so
//! only the request bodies and the few façade-owned responses live here.

use serde::{Deserialize, Serialize};

/// Body of `POST /logs`
#[derive(Debug, Clone, Deserialize)]
pub struct LogRequest {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_source")]
    pub source: String,
    pub message: String,
}

fn default_level() -> String {
    "INFO".to_string()
}

fn default_source() -> String {
    "api".to_string()
}

/// Body of `POST /process`; an empty body means "drain everything"
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessRequest {
    #[serde(default)]
    pub max_items: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogAccepted {
    pub status: String,
    pub message: String,
    pub id: u64,
}

impl LogAccepted {
    pub fn new(id: u64) -> Self {
        Self {
            status: "ok".to_string(),
            message: "log accepted".to_string(),
            id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}
