//! Write stage: projects a payload into a new snapshot and swaps `..data`.
//!
//! Sequence:
//! 1. validate and normalize the payload
//! 2. read `..data` to find the current snapshot
//! 3. diff against it; return early when nothing changed
//! 4. allocate a new snapshot directory
//! 5. materialize the payload into it
//! 6. create visible links for new top-level names
//! 7. stage `..data_tmp -> <new snapshot>`
//! 8. swap `..data` (the only step readers can observe)
//! 9. prune visible links whose name left the payload
//! 10. remove the previous snapshot and any orphans
//!
//! Failures before step 8 leave the previous version current. Failures after
//! it surface as `ErrorKind::Cleanup`.

use std::time::Instant;

use log::Level;
use rustix::fd::OwnedFd;
use serde_json::json;

use crate::adapters::LockGuard;
use crate::constants::{DATA_DIR_NAME, NEW_DATA_DIR_NAME};
use crate::fs::atomic::{fsync_dirfd, open_dir_nofollow, read_link_at, symlink_at, unlink_if_present};
use crate::fs::diff::{diff_snapshot, SnapshotDiff};
use crate::fs::materialize::write_payload_to_dir;
use crate::fs::snapshot::{create_snapshot_dir, prune_orphan_snapshots, remove_snapshot_dir, SnapshotDir};
use crate::fs::visible::{create_visible_links, remove_visible_paths};
use crate::logging::audit::AuditCtx;
use crate::logging::{AuditSink, FactsEmitter, StageLogger};
use crate::policy::LockingPolicy;
use crate::types::{CleanPayload, Error, ErrorKind, Payload, Result, WriteOutcome};

use super::AtomicWriter;

pub(crate) fn run<E: FactsEmitter, A: AuditSink>(
    w: &AtomicWriter<E, A>,
    payload: &Payload,
) -> Result<WriteOutcome> {
    let t0 = Instant::now();
    let tctx = AuditCtx::new(&w.facts, w.target_dir.display().to_string());
    let slog = StageLogger::new(&tctx);

    let result = project(w, payload, &slog);

    let duration_ms = u64::try_from(t0.elapsed().as_millis()).unwrap_or(u64::MAX);
    match &result {
        Ok(WriteOutcome::Unchanged) => {}
        Ok(WriteOutcome::Updated { snapshot, removed }) => {
            slog.write_result()
                .merge(json!({
                    "snapshot": snapshot,
                    "removed": removed,
                    "duration_ms": duration_ms,
                }))
                .emit_success();
        }
        Err(e) if e.is_committed() => {
            w.audit.log(Level::Warn, &format!("write: new data is current, cleanup incomplete: {e}"));
            slog.write_result()
                .error(e)
                .field("duration_ms", json!(duration_ms))
                .emit_warn();
        }
        Err(e) => {
            w.audit.log(Level::Error, &format!("write: failed: {e}"));
            slog.write_result()
                .error(e)
                .field("duration_ms", json!(duration_ms))
                .emit_failure();
        }
    }
    result
}

fn project<E: FactsEmitter, A: AuditSink>(
    w: &AtomicWriter<E, A>,
    payload: &Payload,
    slog: &StageLogger<'_>,
) -> Result<WriteOutcome> {
    let target = w.target_dir();
    let fsync = w.policy.durability.fsync;

    // (1)
    let clean = CleanPayload::validate(payload)?;
    if clean.is_empty() {
        w.audit.log(
            Level::Info,
            &format!(
                "write: empty payload, all visible entries in {} will be removed",
                target.display()
            ),
        );
    }

    let _guard = acquire_lock(w)?;
    slog.write_attempt()
        .merge(json!({
            "entries": clean.len(),
            "swap_strategy": w.swap.name(),
            "atomic_swap": w.swap.is_atomic(),
            "lock_backend": w.lock.as_ref().map_or("none", |l| l.backend()),
        }))
        .emit_success();

    // (2)
    let old = w.current_snapshot()?;

    // (3)
    let mut diff = SnapshotDiff::default();
    if let Some(old_name) = old.as_deref() {
        diff = diff_snapshot(&clean, &target.join(old_name))
            .map_err(|e| Error::io("unable to compare payload with current snapshot", &e))?;
        if diff.is_noop() {
            w.audit.log(
                Level::Debug,
                &format!("write: no update required for {}", target.display()),
            );
            slog.write_noop()
                .field("snapshot", json!(old_name))
                .emit_success();
            return Ok(WriteOutcome::Unchanged);
        }
        w.audit.log(
            Level::Info,
            &format!("write: update required for {}", target.display()),
        );
    }

    // (4)
    let snap = create_snapshot_dir(target)
        .map_err(|e| Error::io("error creating new snapshot directory", &e))?;

    // (5)
    if let Err(e) = write_payload_to_dir(&clean, &snap.path, fsync) {
        discard_snapshot(w, &snap);
        return Err(Error::io("unable to write payload to snapshot directory", &e));
    }
    w.audit.log(
        Level::Info,
        &format!("write: materialized {} entries into {}", clean.len(), snap.name),
    );

    // (6) On failure the snapshot is left for the next orphan sweep.
    let created = create_visible_links(&clean, target)
        .map_err(|e| Error::io("unable to create visible symlinks in target directory", &e))?;
    if !created.is_empty() {
        w.audit.log(
            Level::Debug,
            &format!("write: created visible links {}", created.join(", ")),
        );
    }

    // (7)
    let dirfd = match open_dir_nofollow(target).and_then(|fd| {
        stage_new_data_link(&fd, &snap.name)?;
        Ok(fd)
    }) {
        Ok(fd) => fd,
        Err(e) => {
            discard_snapshot(w, &snap);
            return Err(Error::io("unable to create symbolic link for atomic update", &e));
        }
    };

    // (8)
    let mut cleanup_errors = Vec::new();
    if let Err(e) = w.swap.commit(&dirfd, &snap.name, old.as_deref()) {
        let _ = unlink_if_present(&dirfd, NEW_DATA_DIR_NAME);
        match read_link_at(&dirfd, DATA_DIR_NAME) {
            // The strategy failed after `..data` flipped: the new snapshot must stay.
            Ok(Some(current)) if current == snap.name => {
                cleanup_errors.push(format!(
                    "swap reported an error after {} became current: {e}",
                    snap.name
                ));
            }
            Ok(_) => {
                discard_snapshot(w, &snap);
                return Err(Error::io("unable to swap data directory link", &e));
            }
            // Unknown state; the snapshot is left for the next orphan sweep.
            Err(_) => return Err(Error::io("unable to swap data directory link", &e)),
        }
    }
    if fsync {
        let _ = fsync_dirfd(&dirfd);
    }
    w.audit.log(
        Level::Info,
        &format!("write: {} is now current ({})", snap.name, w.swap.name()),
    );

    // (9) + (10)
    if let Err(e) = remove_visible_paths(&diff.paths_to_remove, target) {
        cleanup_errors.push(format!("unable to remove old visible symlinks: {e}"));
    }
    if let Some(old_name) = old.as_deref() {
        if let Err(e) = remove_snapshot_dir(&target.join(old_name)) {
            cleanup_errors.push(format!("unable to remove old data directory {old_name}: {e}"));
        }
    }
    if w.policy.cleanup.prune_orphans {
        match prune_orphan_snapshots(target, &snap.name) {
            Ok(0) => {}
            Ok(pruned) => slog
                .prune_result()
                .field("pruned_count", json!(pruned))
                .emit_success(),
            Err(e) => {
                slog.prune_result()
                    .field("error", json!(e.to_string()))
                    .emit_failure();
                cleanup_errors.push(format!("unable to prune orphaned snapshots: {e}"));
            }
        }
    }
    if !cleanup_errors.is_empty() {
        return Err(Error::new(ErrorKind::Cleanup, cleanup_errors.join("; ")));
    }

    let removed = diff.top_level_removals().map(str::to_owned).collect();
    Ok(WriteOutcome::Updated {
        snapshot: snap.name,
        removed,
    })
}

fn acquire_lock<E: FactsEmitter, A: AuditSink>(
    w: &AtomicWriter<E, A>,
) -> Result<Option<Box<dyn LockGuard>>> {
    match &w.lock {
        Some(mgr) => mgr
            .acquire_process_lock(w.policy.governance.lock_timeout_ms)
            .map(Some),
        None if w.policy.governance.locking == LockingPolicy::Required => Err(Error::new(
            ErrorKind::Locking,
            "policy requires a lock manager but none is configured",
        )),
        None => Ok(None),
    }
}

/// Point `..data_tmp` at `snapshot`, replacing any leftover from an interrupted write.
fn stage_new_data_link(dirfd: &OwnedFd, snapshot: &str) -> std::io::Result<()> {
    unlink_if_present(dirfd, NEW_DATA_DIR_NAME)?;
    symlink_at(dirfd, snapshot, NEW_DATA_DIR_NAME)
}

fn discard_snapshot<E: FactsEmitter, A: AuditSink>(w: &AtomicWriter<E, A>, snap: &SnapshotDir) {
    if let Err(e) = remove_snapshot_dir(&snap.path) {
        w.audit.log(
            Level::Warn,
            &format!("write: unable to discard snapshot {}: {e}", snap.name),
        );
    }
}
