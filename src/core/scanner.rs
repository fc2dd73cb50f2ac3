//! Single-directory scanner (spec §4.B).
//!
//! Enumerates one directory's immediate entries, classifying each without
//! following symlinks. Every failure here is recovered locally: the caller
//! never sees an `Err` from [`scan`] — a directory that can't be read comes
//! back as an empty, `incomplete` node, matching the "enumeration and stat
//! errors never propagate" policy in spec §7.

use std::path::{Path, PathBuf};

/// Outcome of scanning one directory's immediate entries.
pub struct ScanOutcome {
    /// Sum of byte lengths of regular files directly inside this directory.
    pub files_size: u64,
    /// Set if the directory itself, or any entry within it, couldn't be
    /// read or stat'd.
    pub incomplete: bool,
    /// Full paths of immediate subdirectories, for the caller to queue.
    pub subdirs: Vec<PathBuf>,
}

pub fn scan(path: &Path) -> ScanOutcome {
    let entries = match std::fs::read_dir(path) {
        Ok(entries) => entries,
        Err(error) => {
            tracing::debug!(path = %path.display(), %error, "directory unreadable, marking incomplete");
            return ScanOutcome {
                files_size: 0,
                incomplete: true,
                subdirs: Vec::new(),
            };
        }
    };

    let mut files_size: u64 = 0;
    let mut incomplete = false;
    let mut subdirs = Vec::new();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                tracing::debug!(path = %path.display(), %error, "entry read failed");
                incomplete = true;
                continue;
            }
        };

        // `file_type()` comes from the directory read itself on most
        // platforms and does not follow symlinks.
        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(error) => {
                tracing::debug!(path = %entry.path().display(), %error, "stat failed");
                incomplete = true;
                continue;
            }
        };

        if file_type.is_symlink() {
            // Neither a file nor a directory for sizing purposes: ignored
            // entirely, not an error.
            continue;
        } else if file_type.is_dir() {
            subdirs.push(entry.path());
        } else if file_type.is_file() {
            match entry.metadata() {
                Ok(meta) => files_size = files_size.saturating_add(meta.len()),
                Err(error) => {
                    tracing::debug!(path = %entry.path().display(), %error, "stat failed");
                    incomplete = true;
                }
            }
        }
        // Sockets, devices, FIFOs: ignored, not an error.
    }

    ScanOutcome {
        files_size,
        incomplete,
        subdirs,
    }
}
