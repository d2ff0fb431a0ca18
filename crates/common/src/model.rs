// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire types exchanged between controller, agent, and worker.

use serde::{Deserialize, Serialize};

/// API credential header.
pub const API_KEY_HEADER: &str = "x-api-key";
/// Agent identity header.
pub const AGENT_ID_HEADER: &str = "x-agent-id";

/// A configuration version as published by the controller.
///
/// `version` is assigned by the controller and only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub version: i64,
    pub url: String,
    pub poll_interval_seconds: i64,
}

/// Controller answer to `POST /register`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub agent_id: String,
    #[serde(default)]
    pub poll_url: String,
    #[serde(default)]
    pub poll_interval_seconds: i64,
}

/// Returns true when `raw` is an absolute http(s) URL with a host.
pub fn is_http_url(raw: &str) -> bool {
    match raw.parse::<axum::http::Uri>() {
        Ok(uri) => {
            matches!(uri.scheme_str(), Some("http") | Some("https"))
                && uri.host().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}
