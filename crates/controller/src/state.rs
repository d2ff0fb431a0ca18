// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use confsync_common::auth::ApiKey;

use crate::cache::ConfigCache;
use crate::config::ControllerConfig;
use crate::store::{AgentRegistry, ConfigStore};

/// Shared state behind every controller handler.
pub struct ControllerState {
    pub cache: ConfigCache,
    pub agents: Arc<dyn AgentRegistry>,
    pub agent_key: ApiKey,
    pub admin_key: ApiKey,
    /// Poll target handed out at registration.
    pub poll_url: String,
    /// Interval handed out while no config carries a positive one.
    pub default_poll_interval_secs: i64,
}

impl ControllerState {
    pub fn new(
        config: &ControllerConfig,
        store: Arc<dyn ConfigStore>,
        agents: Arc<dyn AgentRegistry>,
    ) -> Self {
        Self {
            cache: ConfigCache::new(store),
            agents,
            agent_key: ApiKey::new(config.agent_api_key.as_str()),
            admin_key: ApiKey::new(config.admin_api_key.as_str()),
            poll_url: config.poll_url.clone(),
            default_poll_interval_secs: config.default_poll_interval_seconds,
        }
    }
}
