// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upstream request behind `GET /hit`.

use anyhow::Context;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

/// Content type reported when the upstream sends none.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// What the upstream answered, relayed as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// GET `url`. Any status is a successful fetch; only transport and
    /// body-read failures are errors.
    pub async fn get(&self, url: &str) -> anyhow::Result<Fetched> {
        let resp = self.client.get(url).send().await.with_context(|| format!("get {url}"))?;
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_owned();
        let body = resp.bytes().await.with_context(|| format!("read body from {url}"))?;
        Ok(Fetched { status, content_type, body: body.to_vec() })
    }
}
