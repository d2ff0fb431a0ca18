// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only HTTP surface of the agent.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::StateHandle;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "running" })
}

/// `GET /state`: point-in-time copy of the sync state.
pub async fn state(State(handle): State<StateHandle>) -> impl IntoResponse {
    Json(handle.snapshot().await)
}

pub fn build_router(handle: StateHandle) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/state", get(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(handle)
}
