pub mod atomic;
pub mod diff;
pub mod materialize;
pub mod snapshot;
pub mod swap;
pub mod visible;

pub use atomic::{fsync_dirfd, open_dir_nofollow, read_link_at, unlink_if_present};
pub use diff::{diff_snapshot, paths_to_remove, should_write_payload, SnapshotDiff};
pub use materialize::write_payload_to_dir;
pub use snapshot::{create_snapshot_dir, prune_orphan_snapshots, remove_snapshot_dir, SnapshotDir};
pub use swap::{RecreateSwap, RenameSwap, SwapStrategy};
pub use visible::{create_visible_links, remove_visible_paths};
