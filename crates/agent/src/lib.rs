// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Confsync agent: keeps a worker's configuration in step with the
//! controller across restarts and outages.

pub mod backoff;
pub mod client;
pub mod config;
pub mod error;
pub mod state;
pub mod store;
pub mod sync;
pub mod transport;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use anyhow::Context;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use confsync_common::http::build_client;
use confsync_common::shutdown::spawn_signal_handler;

use crate::client::{HttpControllerClient, HttpWorkerClient};
use crate::config::AgentConfig;
use crate::store::FileStateStore;
use crate::sync::SyncEngine;

/// Run the sync loop and the observability endpoint until shutdown.
pub async fn run(config: AgentConfig) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    let http = build_client(config.request_timeout())?;
    let controller = HttpControllerClient::new(
        config.controller_base_url.clone(),
        config.controller_api_key.clone(),
        http.clone(),
    );
    let worker =
        HttpWorkerClient::new(config.worker_base_url.clone(), config.worker_api_key.clone(), http);
    let state_path = config.state_path().context("STATE_PATH is required")?.to_owned();
    let store = FileStateStore::new(state_path.clone());

    let engine = SyncEngine::new(
        Arc::new(controller),
        Arc::new(worker),
        Arc::new(store),
        config.sync_settings(),
    );
    let router = transport::build_router(engine.handle());
    let sync_task = tokio::spawn(engine.run(shutdown.clone()));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(
        controller = %config.controller_base_url,
        worker = %config.worker_base_url,
        state_path = %state_path.display(),
        "confsync agent listening on {addr}"
    );

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await;
    // A server error must still stop the sync loop.
    shutdown.cancel();
    sync_task.await?;
    served?;
    Ok(())
}
