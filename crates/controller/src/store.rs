// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage seams for configs and agent identities.
//!
//! The in-memory implementations back the default binary and the tests; a
//! database-backed store plugs in behind the same traits.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use confsync_common::model::RemoteConfig;

/// Versioned config history. Versions are assigned by the store and grow
/// by one per insert.
pub trait ConfigStore: Send + Sync {
    /// The highest version, or `None` when nothing was ever stored.
    fn latest(&self) -> anyhow::Result<Option<RemoteConfig>>;

    /// Insert a new version and return it.
    fn create(&self, url: &str, poll_interval_seconds: i64) -> anyhow::Result<RemoteConfig>;
}

/// Known agent identities.
pub trait AgentRegistry: Send + Sync {
    /// Record `agent_id`. Saving a known identity is a no-op.
    fn save(&self, agent_id: &str) -> anyhow::Result<()>;
}

fn lock<'a, T>(m: &'a Mutex<T>, what: &str) -> anyhow::Result<MutexGuard<'a, T>> {
    m.lock().map_err(|_| anyhow::anyhow!("{what} lock poisoned"))
}

#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    history: Mutex<Vec<RemoteConfig>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn latest(&self) -> anyhow::Result<Option<RemoteConfig>> {
        Ok(lock(&self.history, "config store")?.last().cloned())
    }

    fn create(&self, url: &str, poll_interval_seconds: i64) -> anyhow::Result<RemoteConfig> {
        let mut history = lock(&self.history, "config store")?;
        let version = history.last().map_or(1, |c| c.version + 1);
        let config = RemoteConfig { version, url: url.to_owned(), poll_interval_seconds };
        history.push(config.clone());
        Ok(config)
    }
}

#[derive(Debug, Default)]
pub struct MemoryAgentRegistry {
    agents: Mutex<BTreeSet<String>>,
}

impl MemoryAgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, agent_id: &str) -> bool {
        lock(&self.agents, "agent registry").is_ok_and(|a| a.contains(agent_id))
    }

    pub fn len(&self) -> usize {
        lock(&self.agents, "agent registry").map_or(0, |a| a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AgentRegistry for MemoryAgentRegistry {
    fn save(&self, agent_id: &str) -> anyhow::Result<()> {
        lock(&self.agents, "agent registry")?.insert(agent_id.to_owned());
        Ok(())
    }
}
