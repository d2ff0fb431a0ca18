// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Confsync worker: holds the config forwarded by its agent.

pub mod config;
pub mod fetch;
pub mod slot;
pub mod state;
pub mod transport;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use confsync_common::auth::ApiKey;
use confsync_common::http::build_client;
use confsync_common::shutdown::spawn_signal_handler;

use crate::config::WorkerConfig;
use crate::fetch::HttpFetcher;
use crate::state::WorkerState;
use crate::transport::build_router;

/// Run the worker until shutdown.
pub async fn run(config: WorkerConfig) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    let fetcher = HttpFetcher::new(build_client(config.request_timeout())?);
    let state = Arc::new(WorkerState::new(ApiKey::new(config.agent_api_key.as_str()), fetcher));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("confsync worker listening on {addr}");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;
    Ok(())
}
