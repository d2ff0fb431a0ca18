// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport for the controller.

pub mod http;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use confsync_common::auth::require_api_key;

use crate::state::ControllerState;

/// Build the axum `Router` with all controller routes.
///
/// Agent and admin routes sit behind different API keys; `/config` is
/// shared between them by method.
pub fn build_router(state: Arc<ControllerState>) -> Router {
    let agent = Router::new()
        .route("/register", post(http::register))
        .route("/config", get(http::get_config))
        .route_layer(middleware::from_fn_with_state(state.agent_key.clone(), require_api_key));

    let admin = Router::new()
        .route("/config", post(http::create_config))
        .route_layer(middleware::from_fn_with_state(state.admin_key.clone(), require_api_key));

    Router::new()
        // Health (no auth)
        .route("/health", get(http::health))
        .merge(agent)
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
