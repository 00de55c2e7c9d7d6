//! Best-effort telemetry sinks
//!
//! Recording an event never fails and never blocks on anything slower than a
//! local file append. Sink errors are logged and swallowed.

use crate::config::TelemetrySinkKind;
use crate::layout::Layout;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// Destination for telemetry events
pub trait TelemetrySink: Send + Sync {
    fn record(&self, event: &str, payload: Value);
}

pub type SharedTelemetry = Arc<dyn TelemetrySink>;

/// Build the sink selected in configuration
pub fn from_config(kind: TelemetrySinkKind, layout: &Layout) -> SharedTelemetry {
    match kind {
        TelemetrySinkKind::Jsonl => Arc::new(JsonlTelemetry::new(layout.telemetry_file())),
        TelemetrySinkKind::Tracing => Arc::new(TracingTelemetry),
        TelemetrySinkKind::Off => Arc::new(NoopTelemetry),
    }
}

/// Appends one JSON object per line
pub struct JsonlTelemetry {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlTelemetry {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let _guard = self.write_lock.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")
    }
}

impl TelemetrySink for JsonlTelemetry {
    fn record(&self, event: &str, payload: Value) {
        let line = json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "event": event,
            "data": payload,
        })
        .to_string();

        if let Err(e) = self.append(&line) {
            tracing::debug!(event, error = %e, "Telemetry write failed");
        }
    }
}

/// Emits events as debug-level tracing records
#[derive(Debug, Default)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn record(&self, event: &str, payload: Value) {
        tracing::debug!(target: "stake::telemetry", event, %payload, "telemetry");
    }
}

#[derive(Debug, Default)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn record(&self, _event: &str, _payload: Value) {}
}

/// Keeps events in memory; used to observe what the tracker reports
#[derive(Debug, Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<(String, Value)>>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(String, Value)> {
        self.events.lock().clone()
    }

    /// Names of recorded events, in order
    pub fn names(&self) -> Vec<String> {
        self.events.lock().iter().map(|(name, _)| name.clone()).collect()
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn record(&self, event: &str, payload: Value) {
        self.events.lock().push((event.to_string(), payload));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_jsonl_appends_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("telemetry.jsonl");
        let sink = JsonlTelemetry::new(path.clone());

        sink.record("file_change", json!({"file": "a.py"}));
        sink.record("stake_created", json!({"name": "n1"}));

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "file_change");
        assert_eq!(lines[0]["data"]["file"], "a.py");
        assert_eq!(lines[1]["event"], "stake_created");
    }

    #[test]
    fn test_jsonl_failure_is_swallowed() {
        let temp_dir = TempDir::new().unwrap();
        // Parent directory does not exist
        let sink = JsonlTelemetry::new(temp_dir.path().join("missing/telemetry.jsonl"));
        sink.record("file_change", json!({}));
    }
}
