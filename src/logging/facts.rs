use log::Level;
use serde_json::Value;

/// Receives one structured fact per writer stage.
pub trait FactsEmitter {
    fn emit(&self, subsystem: &str, event: &str, decision: &str, fields: Value);
}

/// Receives human-readable progress and failure lines.
pub trait AuditSink {
    fn log(&self, level: Level, msg: &str);
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonlSink;

impl FactsEmitter for JsonlSink {
    fn emit(&self, _subsystem: &str, _event: &str, _decision: &str, _fields: Value) {}
}

impl AuditSink for JsonlSink {
    fn log(&self, _level: Level, _msg: &str) {}
}

/// Forwards to the `log` facade; facts go out as one JSON line at debug level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl FactsEmitter for LogSink {
    fn emit(&self, subsystem: &str, event: &str, decision: &str, fields: Value) {
        log::debug!(target: "projector::facts", "{subsystem} {event} {decision} {fields}");
    }
}

impl AuditSink for LogSink {
    fn log(&self, level: Level, msg: &str) {
        log::log!(target: "projector", level, "{msg}");
    }
}
