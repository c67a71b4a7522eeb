//! Scratch-directory sweep for stale prompt archives.
//!
//! Generated `.npz` files are handed to the UI as downloads and are not
//! needed afterwards.  Every archive operation first deletes archives whose
//! modification time is older than the TTL.  The sweep is best-effort: any
//! failure is logged at debug level and skipped.

use std::path::Path;
use std::time::{Duration, SystemTime};

/// Delete `*.npz` files in `dir` older than `ttl`.  Returns how many were
/// removed.
pub fn sweep_stale_archives(dir: &Path, ttl: Duration) -> usize {
    sweep_at(dir, ttl, SystemTime::now())
}

fn sweep_at(dir: &Path, ttl: Duration, now: SystemTime) -> usize {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("cleanup: cannot list {}: {e}", dir.display());
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("npz") {
            continue;
        }
        let modified = match entry.metadata().and_then(|m| {
            if m.is_file() {
                m.modified()
            } else {
                Err(std::io::Error::other("not a regular file"))
            }
        }) {
            Ok(t) => t,
            Err(e) => {
                log::debug!("cleanup: skipping {}: {e}", path.display());
                continue;
            }
        };

        let age = now.duration_since(modified).unwrap_or_default();
        if age <= ttl {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                removed += 1;
                log::debug!("cleanup: removed {} ({}s old)", path.display(), age.as_secs());
            }
            Err(e) => log::debug!("cleanup: failed to remove {}: {e}", path.display()),
        }
    }
    removed
}
