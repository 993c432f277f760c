//! Shared test helpers for the projector integration tests.
#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use projector::fs::snapshot::is_snapshot_dir_name;
use projector::logging::{FactsEmitter, JsonlSink};
use projector::policy::Policy;
use projector::{AtomicWriter, FileProjection, Payload};

/// A simple in-memory emitter to capture facts during tests.
#[derive(Clone, Default, Debug)]
pub struct TestEmitter {
    pub events: Arc<Mutex<Vec<(String, String, String, Value)>>>,
}

impl FactsEmitter for TestEmitter {
    fn emit(&self, subsystem: &str, event: &str, decision: &str, fields: Value) {
        self.events
            .lock()
            .unwrap()
            .push((subsystem.into(), event.into(), decision.into(), fields));
    }
}

impl TestEmitter {
    /// `(decision, fields)` of every fact with the given event name.
    pub fn of(&self, event: &str) -> Vec<(String, Value)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, e, _, _)| e == event)
            .map(|(_, _, d, f)| (d.clone(), f.clone()))
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

pub fn payload(entries: &[(&str, &str, u32)]) -> Payload {
    entries
        .iter()
        .map(|(k, v, m)| ((*k).to_string(), FileProjection::new(*v, *m)))
        .collect()
}

pub fn writer(dir: &Path) -> AtomicWriter<TestEmitter, JsonlSink> {
    writer_with(dir, Policy::default()).0
}

pub fn writer_with(dir: &Path, policy: Policy) -> (AtomicWriter<TestEmitter, JsonlSink>, TestEmitter) {
    let facts = TestEmitter::default();
    let w = AtomicWriter::with_sinks(dir, facts.clone(), JsonlSink, policy).expect("writer");
    (w, facts)
}

/// Snapshot directory names present in `dir`, sorted.
pub fn snapshot_dirs(dir: &Path) -> Vec<String> {
    let mut out: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().to_str().map(str::to_owned))
        .filter(|n| is_snapshot_dir_name(n))
        .collect();
    out.sort();
    out
}

/// All entry names in `dir`, sorted.
pub fn entries(dir: &Path) -> Vec<String> {
    let mut out: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().to_str().map(str::to_owned))
        .collect();
    out.sort();
    out
}

pub fn data_link(dir: &Path) -> Option<String> {
    fs::read_link(dir.join("..data"))
        .ok()
        .map(|p| p.to_string_lossy().into_owned())
}

/// Content and permission bits of `rel` read through the visible links.
pub fn read_visible(dir: &Path, rel: &str) -> (String, u32) {
    let p = dir.join(rel);
    let data = fs::read_to_string(&p).unwrap_or_else(|e| panic!("read {rel}: {e}"));
    let mode = fs::metadata(&p).unwrap().permissions().mode() & 0o7777;
    (data, mode)
}

pub fn is_symlink(p: &Path) -> bool {
    fs::symlink_metadata(p)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}
