// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use tokio::sync::RwLock;

use confsync_common::model::RemoteConfig;

/// The config the worker currently acts on. Reads return copies; a set
/// replaces the whole value.
#[derive(Debug, Default)]
pub struct ConfigSlot {
    current: RwLock<Option<RemoteConfig>>,
}

impl ConfigSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> Option<RemoteConfig> {
        self.current.read().await.clone()
    }

    pub async fn set(&self, config: RemoteConfig) {
        *self.current.write().await = Some(config);
    }
}
