// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sync state persistence: load/save to a JSON file with atomic writes.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::Context;

use crate::state::SyncState;

/// Durable storage for [`SyncState`].
pub trait StateStore: Send + Sync {
    /// Load the stored state. A store with nothing in it yields an empty
    /// state, not an error.
    fn load(&self) -> anyhow::Result<SyncState>;

    fn save(&self, state: &SyncState) -> anyhow::Result<()>;
}

/// [`StateStore`] backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> anyhow::Result<SyncState> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(SyncState::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("read state file {}", self.path.display()))
            }
        };
        let state = serde_json::from_str(&contents)
            .with_context(|| format!("parse state file {}", self.path.display()))?;
        Ok(state)
    }

    /// Write to a uniquely named sibling temp file, then rename over the target.
    ///
    /// The temp name carries PID + counter so concurrent saves never share a
    /// `.tmp` file (a shorter write could leave trailing bytes from a longer one).
    fn save(&self, state: &SyncState) -> anyhow::Result<()> {
        static COUNTER: AtomicU32 = AtomicU32::new(0);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create state dir {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(state)?;
        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp_name = format!(
            "{}.{}.{}.tmp",
            self.path.file_name().unwrap_or_default().to_string_lossy(),
            std::process::id(),
            seq,
        );
        let tmp_path = self.path.with_file_name(tmp_name);
        std::fs::write(&tmp_path, json)
            .with_context(|| format!("write state temp file {}", tmp_path.display()))?;
        if let Err(e) = std::fs::rename(&tmp_path, &self.path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e).with_context(|| format!("replace state file {}", self.path.display()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
