// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-through cache of the latest config.
//!
//! Readers share the lock and get copies. Writers replace the whole cached
//! value under the write lock, so a reader never sees a `version` from one
//! config paired with the `url` of another. A fill after a miss never
//! replaces a newer cached version with an older one.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use confsync_common::model::RemoteConfig;

use crate::store::ConfigStore;

pub struct ConfigCache {
    store: Arc<dyn ConfigStore>,
    latest: RwLock<Option<RemoteConfig>>,
}

impl ConfigCache {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store, latest: RwLock::new(None) }
    }

    /// The latest config, loading it from the store on a miss.
    pub async fn latest(&self) -> anyhow::Result<Option<RemoteConfig>> {
        if let Some(cached) = self.latest.read().await.as_ref() {
            return Ok(Some(cached.clone()));
        }

        let Some(loaded) = self.store.latest()? else {
            return Ok(None);
        };
        debug!(version = loaded.version, "config cache filled from store");
        let mut slot = self.latest.write().await;
        Ok(Some(install(&mut slot, loaded)))
    }

    /// Store a new version and make it visible to every later read.
    pub async fn create(&self, url: &str, poll_interval_seconds: i64) -> anyhow::Result<RemoteConfig> {
        // Held across the insert so creates are serialised with each other
        // and with fills.
        let mut slot = self.latest.write().await;
        let created = self.store.create(url, poll_interval_seconds)?;
        Ok(install(&mut slot, created))
    }
}

/// Replace the cached value unless it already holds a newer version.
/// Returns what the slot holds afterwards.
fn install(slot: &mut Option<RemoteConfig>, candidate: RemoteConfig) -> RemoteConfig {
    match slot.as_ref() {
        Some(current) if current.version > candidate.version => current.clone(),
        _ => {
            *slot = Some(candidate.clone());
            candidate
        }
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
