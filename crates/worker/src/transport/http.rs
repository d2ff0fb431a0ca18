// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for the worker.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use confsync_common::error::ErrorCode;
use confsync_common::model::{is_http_url, RemoteConfig};

use crate::state::WorkerState;

// -- Request/Response types ---------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Body of `POST /config`. Only `url` is required.
#[derive(Debug, Deserialize)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub poll_interval_seconds: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigUpdateResponse {
    pub message: String,
}

// -- Handlers -----------------------------------------------------------------

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "running" })
}

/// `POST /config`: replace the current config.
pub async fn set_config(
    State(s): State<Arc<WorkerState>>,
    body: Result<Json<ConfigUpdate>, JsonRejection>,
) -> Response {
    let Json(update) = match body {
        Ok(body) => body,
        Err(e) => return ErrorCode::from(&e).to_http_response(e.body_text()),
    };
    if !is_http_url(&update.url) {
        return ErrorCode::ValidationError.to_http_response("url must be an absolute http(s) URL");
    }

    let config = RemoteConfig {
        version: update.version,
        url: update.url,
        poll_interval_seconds: update.poll_interval_seconds,
    };
    info!(
        version = config.version,
        url = %config.url,
        poll_interval_secs = config.poll_interval_seconds,
        "worker config updated"
    );
    s.slot.set(config).await;
    Json(ConfigUpdateResponse { message: "config updated".to_owned() }).into_response()
}

/// `GET /state`: the current config.
pub async fn get_state(State(s): State<Arc<WorkerState>>) -> Response {
    match s.slot.get().await {
        Some(config) => Json(config).into_response(),
        None => ErrorCode::NotFound.to_http_response("no config applied"),
    }
}

/// `GET /hit`: fetch the configured URL and relay the answer.
pub async fn hit(State(s): State<Arc<WorkerState>>) -> Response {
    let Some(config) = s.slot.get().await else {
        return ErrorCode::NotFound.to_http_response("no config applied");
    };

    match s.fetcher.get(&config.url).await {
        Ok(fetched) => {
            let status = StatusCode::from_u16(fetched.status).unwrap_or(StatusCode::OK);
            (status, [(CONTENT_TYPE, fetched.content_type)], fetched.body).into_response()
        }
        Err(e) => {
            warn!(url = %config.url, err = %format!("{e:#}"), "hit failed");
            ErrorCode::UpstreamError.to_http_response(format!("upstream request failed: {e}"))
        }
    }
}
