// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Confsync controller: the authority agents register with and poll.

pub mod cache;
pub mod conditional;
pub mod config;
pub mod state;
pub mod store;
pub mod transport;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use confsync_common::shutdown::spawn_signal_handler;

use crate::config::ControllerConfig;
use crate::state::ControllerState;
use crate::store::{MemoryAgentRegistry, MemoryConfigStore};
use crate::transport::build_router;

/// Run the controller with in-memory stores until shutdown.
pub async fn run(config: ControllerConfig) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    let state = Arc::new(ControllerState::new(
        &config,
        Arc::new(MemoryConfigStore::new()),
        Arc::new(MemoryAgentRegistry::new()),
    ));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(poll_url = %config.poll_url, "confsync controller listening on {addr}");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;
    Ok(())
}

/// Assert that an expression is `Err` and its message contains a substring.
#[cfg(test)]
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = format!("{err:#}");
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}
