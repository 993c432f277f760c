// Structured facts for the write stages.
//
// Every fact carries the same envelope: `schema_version`, `ts`, `write_id`,
// `target`, `stage` and `decision`. One `AuditCtx` is built per `write` call.
use serde_json::{json, Value};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::constants::SUBSYSTEM;
use crate::logging::FactsEmitter;
use crate::types::errors::Error;

pub(crate) const SCHEMA_VERSION: i64 = 1;

pub const TS_ZERO: &str = "1970-01-01T00:00:00Z";

pub fn now_iso() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| TS_ZERO.to_string())
}

pub(crate) fn new_write_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) struct AuditCtx<'a> {
    pub facts: &'a dyn FactsEmitter,
    pub write_id: String,
    pub target: String,
    pub ts: String,
}

impl<'a> AuditCtx<'a> {
    pub(crate) fn new(facts: &'a dyn FactsEmitter, target: String) -> Self {
        Self {
            facts,
            write_id: new_write_id(),
            target,
            ts: now_iso(),
        }
    }
}

/// Stage for typed audit emission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    WriteAttempt,
    WriteNoop,
    WriteResult,
    PruneResult,
}

impl Stage {
    #[must_use]
    pub const fn as_event(&self) -> &'static str {
        match self {
            Stage::WriteAttempt => "write.attempt",
            Stage::WriteNoop => "write.noop",
            Stage::WriteResult => "write.result",
            Stage::PruneResult => "prune.result",
        }
    }
}

/// Decision severity for audit events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Success,
    Failure,
    Warn,
}

impl Decision {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Decision::Success => "success",
            Decision::Failure => "failure",
            Decision::Warn => "warn",
        }
    }
}

/// Builder facade over audit emission with a centralized envelope.
pub struct StageLogger<'a> {
    ctx: &'a AuditCtx<'a>,
}

impl<'a> StageLogger<'a> {
    pub(crate) fn new(ctx: &'a AuditCtx<'a>) -> Self {
        Self { ctx }
    }

    pub fn write_attempt(&self) -> EventBuilder<'a> {
        EventBuilder::new(self.ctx, Stage::WriteAttempt)
    }
    pub fn write_noop(&self) -> EventBuilder<'a> {
        EventBuilder::new(self.ctx, Stage::WriteNoop)
    }
    pub fn write_result(&self) -> EventBuilder<'a> {
        EventBuilder::new(self.ctx, Stage::WriteResult)
    }
    pub fn prune_result(&self) -> EventBuilder<'a> {
        EventBuilder::new(self.ctx, Stage::PruneResult)
    }
}

pub struct EventBuilder<'a> {
    ctx: &'a AuditCtx<'a>,
    stage: Stage,
    fields: serde_json::Map<String, Value>,
}

impl<'a> EventBuilder<'a> {
    fn new(ctx: &'a AuditCtx<'a>, stage: Stage) -> Self {
        let mut fields = serde_json::Map::new();
        fields.insert("stage".to_string(), json!(stage.as_event()));
        Self { ctx, stage, fields }
    }

    #[must_use]
    pub fn field(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    #[must_use]
    pub fn merge(mut self, extra: Value) -> Self {
        if let Some(obj) = extra.as_object() {
            for (k, v) in obj {
                self.fields.insert(k.clone(), v.clone());
            }
        }
        self
    }

    #[must_use]
    pub fn error(self, err: &Error) -> Self {
        self.field("error_kind", json!(format!("{:?}", err.kind)))
            .field("error", json!(err.msg))
    }

    pub fn emit(self, decision: Decision) {
        let mut fields = self.fields;
        fields
            .entry("decision")
            .or_insert(json!(decision.as_str()));
        fields
            .entry("schema_version")
            .or_insert(json!(SCHEMA_VERSION));
        fields.entry("ts").or_insert(json!(self.ctx.ts));
        fields
            .entry("write_id")
            .or_insert(json!(self.ctx.write_id));
        fields.entry("target").or_insert(json!(self.ctx.target));
        self.ctx.facts.emit(
            SUBSYSTEM,
            self.stage.as_event(),
            decision.as_str(),
            Value::Object(fields),
        );
    }

    pub fn emit_success(self) {
        self.emit(Decision::Success);
    }
    pub fn emit_failure(self) {
        self.emit(Decision::Failure);
    }
    pub fn emit_warn(self) {
        self.emit(Decision::Warn);
    }
}
