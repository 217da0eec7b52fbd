//! JSONL file writer for command audit events.
//!
//! Each [`CommandEvent`] is serialized as a single JSON line with a
//! `type` field and `timestamp`, appended to the file via a buffered writer.

use addy_application::{CommandEvent, CommandLogger};
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// JSONL audit logger that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes on `Drop`. Existing
/// files are appended to, so one log can span many sessions.
pub struct JsonlCommandLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlCommandLogger {
    /// Open (or create) the audit log at the given path.
    ///
    /// Creates parent directories if they don't exist.
    /// Returns `None` if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create audit log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open audit log file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Flatten an event into one audit record. Object payloads contribute
/// their keys directly; anything else lands under `data`.
fn audit_record(event: CommandEvent, timestamp: String) -> Value {
    let CommandEvent {
        event_type,
        payload,
    } = event;
    let mut record = match payload {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => Map::from_iter([("data".to_string(), other)]),
    };
    record.insert("type".to_string(), Value::from(event_type));
    record.insert("timestamp".to_string(), Value::String(timestamp));
    Value::Object(record)
}

impl CommandLogger for JsonlCommandLogger {
    fn log(&self, event: CommandEvent) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let line = match serde_json::to_string(&audit_record(event, timestamp)) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Dropping unserializable audit record");
                return;
            }
        };

        let Ok(mut writer) = self.writer.lock() else {
            return;
        };
        // one record per line, flushed so a crash loses at most the current command
        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            warn!(path = %self.path.display(), error = %e, "Audit log write failed");
        }
    }
}

impl Drop for JsonlCommandLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
