//! Purpose: Define a stable, structured schema for job log lines on stderr.
//! Exports: `Notice`, `notice_json`.
//! Role: Shared contract helper for CLI progress output (non-fatal events).
//! Invariants: Notices never alter stdout payloads.
//! Invariants: JSON schema is stable once published; fields are additive-only.
use serde_json::{Map, Value, json};

use crate::core::log::{LogLevel, classify};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: String,
    pub time: String,
    pub cmd: String,
    pub message: String,
    pub details: Map<String, Value>,
}

impl Notice {
    /// Wrap a logger line; `kind` is derived from the message text.
    pub fn from_log(cmd: &str, time: String, message: &str) -> Self {
        Self {
            kind: level_name(classify(message)).to_string(),
            time,
            cmd: cmd.to_string(),
            message: message.to_string(),
            details: Map::new(),
        }
    }
}

pub fn level_name(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Info => "info",
        LogLevel::Success => "success",
        LogLevel::Warning => "warning",
        LogLevel::Error => "error",
    }
}

pub fn notice_json(notice: &Notice) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(notice.kind));
    inner.insert("time".to_string(), json!(notice.time));
    inner.insert("cmd".to_string(), json!(notice.cmd));
    inner.insert("message".to_string(), json!(notice.message));
    inner.insert("details".to_string(), Value::Object(notice.details.clone()));

    let mut outer = Map::new();
    outer.insert("notice".to_string(), Value::Object(inner));
    Value::Object(outer)
}
