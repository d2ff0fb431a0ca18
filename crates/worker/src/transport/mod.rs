// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport for the worker.

pub mod http;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use confsync_common::auth::require_api_key;

use crate::state::WorkerState;

/// Build the axum `Router` with all worker routes. Only config updates
/// need the agent key.
pub fn build_router(state: Arc<WorkerState>) -> Router {
    let agent = Router::new()
        .route("/config", post(http::set_config))
        .route_layer(middleware::from_fn_with_state(state.agent_key.clone(), require_api_key));

    Router::new()
        .route("/health", get(http::health))
        .route("/state", get(http::get_state))
        .route("/hit", get(http::hit))
        .merge(agent)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
