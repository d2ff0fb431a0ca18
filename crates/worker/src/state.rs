// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use confsync_common::auth::ApiKey;

use crate::fetch::HttpFetcher;
use crate::slot::ConfigSlot;

/// Shared state behind every worker handler.
pub struct WorkerState {
    pub slot: ConfigSlot,
    pub fetcher: HttpFetcher,
    pub agent_key: ApiKey,
}

impl WorkerState {
    pub fn new(agent_key: ApiKey, fetcher: HttpFetcher) -> Self {
        Self { slot: ConfigSlot::new(), fetcher, agent_key }
    }
}
