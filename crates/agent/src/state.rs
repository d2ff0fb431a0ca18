// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use confsync_common::model::{Registration, RemoteConfig};

/// Durable agent state: identity plus the last configuration applied to the
/// worker.
///
/// Field names on disk are kept stable so older state files still load; any
/// missing key reads as empty/zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncState {
    /// Identity issued by the controller. Empty until the first registration.
    pub agent_id: String,
    /// Opaque validator of the last applied config, sent as `If-None-Match`.
    #[serde(rename = "etag")]
    pub marker: String,
    /// URL of the last applied config.
    pub config_url: String,
    /// Where to poll for configuration, relative to the controller or absolute.
    #[serde(rename = "poll_url")]
    pub poll_target: String,
    #[serde(rename = "poll_interval_seconds")]
    pub poll_interval_secs: i64,
    #[serde(rename = "last_config_version")]
    pub applied_version: i64,
}

impl SyncState {
    /// State reported before the first bootstrap completes.
    pub fn with_defaults(poll_target: &str, poll_interval_secs: i64) -> Self {
        Self {
            poll_target: poll_target.to_owned(),
            poll_interval_secs,
            ..Self::default()
        }
    }

    /// Drop a marker that has no config URL behind it.
    ///
    /// A marker without the config it validates would make the controller
    /// answer "unchanged" forever while the worker holds nothing. Returns the
    /// discarded marker when a repair happened.
    pub fn repair(&mut self) -> Option<String> {
        if self.config_url.is_empty() && !self.marker.is_empty() {
            self.applied_version = 0;
            return Some(std::mem::take(&mut self.marker));
        }
        None
    }

    /// Fill an empty poll target and a non-positive interval.
    pub fn fill_defaults(&mut self, poll_target: &str, poll_interval_secs: i64) {
        if self.poll_target.is_empty() {
            self.poll_target = poll_target.to_owned();
        }
        if self.poll_interval_secs <= 0 {
            self.poll_interval_secs = poll_interval_secs;
        }
    }

    /// The config last applied to the worker, if any.
    pub fn cached_config(&self) -> Option<RemoteConfig> {
        if self.config_url.is_empty() {
            return None;
        }
        Some(RemoteConfig {
            version: self.applied_version,
            url: self.config_url.clone(),
            poll_interval_seconds: self.poll_interval_secs,
        })
    }

    /// Take the identity unconditionally; poll settings only when present.
    pub fn adopt_registration(&mut self, reg: &Registration) {
        self.agent_id = reg.agent_id.clone();
        if !reg.poll_url.is_empty() {
            self.poll_target = reg.poll_url.clone();
        }
        if reg.poll_interval_seconds > 0 {
            self.poll_interval_secs = reg.poll_interval_seconds;
        }
    }

    /// Record a config the worker accepted.
    pub fn record_applied(&mut self, config: &RemoteConfig, marker: &str) {
        self.marker = marker.to_owned();
        self.config_url = config.url.clone();
        self.applied_version = config.version;
        if config.poll_interval_seconds > 0 {
            self.poll_interval_secs = config.poll_interval_seconds;
        }
    }
}

/// Read-side view of the live sync state.
///
/// The sync loop publishes whole copies; readers always get a point-in-time
/// clone, never a reference into the loop's state.
#[derive(Debug, Clone, Default)]
pub struct StateHandle {
    inner: Arc<RwLock<SyncState>>,
}

impl StateHandle {
    pub fn new(initial: SyncState) -> Self {
        Self { inner: Arc::new(RwLock::new(initial)) }
    }

    pub async fn snapshot(&self) -> SyncState {
        self.inner.read().await.clone()
    }

    pub async fn publish(&self, state: SyncState) {
        *self.inner.write().await = state;
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
