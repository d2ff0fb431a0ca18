// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for the controller.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::{ETAG, IF_NONE_MATCH};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use confsync_common::error::ErrorCode;
use confsync_common::model::{is_http_url, Registration, AGENT_ID_HEADER};

use crate::conditional::{respond, ConditionalResponse};
use crate::state::ControllerState;

// -- Request/Response types ---------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct CreateConfigRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub poll_interval_seconds: i64,
}

fn header<'a>(headers: &'a HeaderMap, name: impl axum::http::header::AsHeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn valid_agent_id(headers: &HeaderMap) -> Option<Uuid> {
    header(headers, AGENT_ID_HEADER).and_then(|v| Uuid::parse_str(v.trim()).ok())
}

// -- Handlers -----------------------------------------------------------------

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "running" })
}

/// `POST /register`: issue or confirm an agent identity.
pub async fn register(State(s): State<Arc<ControllerState>>, headers: HeaderMap) -> Response {
    let (agent_id, reused) = match valid_agent_id(&headers) {
        Some(id) => (id, true),
        None => (Uuid::new_v4(), false),
    };
    let agent_id = agent_id.to_string();

    if let Err(e) = s.agents.save(&agent_id) {
        error!(agent_id = %agent_id, err = %format!("{e:#}"), "agent registry save failed");
        return ErrorCode::Internal.to_http_response("failed to register agent");
    }

    let poll_interval_seconds = match s.cache.latest().await {
        Ok(Some(cfg)) if cfg.poll_interval_seconds > 0 => cfg.poll_interval_seconds,
        Ok(_) => s.default_poll_interval_secs,
        Err(e) => {
            warn!(err = %format!("{e:#}"), "latest config unavailable, using default interval");
            s.default_poll_interval_secs
        }
    };

    info!(agent_id = %agent_id, reused, poll_interval_secs = poll_interval_seconds, "agent registered");
    Json(Registration { agent_id, poll_url: s.poll_url.clone(), poll_interval_seconds })
        .into_response()
}

/// `GET /config`: conditional read of the latest config.
pub async fn get_config(State(s): State<Arc<ControllerState>>, headers: HeaderMap) -> Response {
    if valid_agent_id(&headers).is_none() {
        return ErrorCode::ValidationError.to_http_response("invalid X-Agent-ID header");
    }

    let config = match s.cache.latest().await {
        Ok(Some(config)) => config,
        Ok(None) => return ErrorCode::NotFound.to_http_response("config not found"),
        Err(e) => {
            error!(err = %format!("{e:#}"), "config lookup failed");
            return ErrorCode::Internal.to_http_response("failed to load config");
        }
    };

    match respond(&config, header(&headers, IF_NONE_MATCH)) {
        ConditionalResponse::NotModified { marker } => {
            (StatusCode::NOT_MODIFIED, [(ETAG, marker)]).into_response()
        }
        ConditionalResponse::Full { config, marker } => {
            (StatusCode::OK, [(ETAG, marker)], Json(config)).into_response()
        }
    }
}

/// `POST /config`: publish a new config version.
pub async fn create_config(
    State(s): State<Arc<ControllerState>>,
    body: Result<Json<CreateConfigRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(e) => return ErrorCode::from(&e).to_http_response(e.body_text()),
    };
    if !is_http_url(&req.url) {
        return ErrorCode::ValidationError.to_http_response("url must be an absolute http(s) URL");
    }
    if req.poll_interval_seconds < 1 {
        return ErrorCode::ValidationError.to_http_response("poll_interval_seconds must be >= 1");
    }

    match s.cache.create(&req.url, req.poll_interval_seconds).await {
        Ok(config) => {
            info!(
                version = config.version,
                url = %config.url,
                poll_interval_secs = config.poll_interval_seconds,
                "config created"
            );
            (StatusCode::CREATED, Json(config)).into_response()
        }
        Err(e) => {
            error!(err = %format!("{e:#}"), "config create failed");
            ErrorCode::Internal.to_http_response("failed to create config")
        }
    }
}
