// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP clients for the controller (register, conditional fetch) and the
//! worker (config forward).

use std::future::Future;
use std::pin::Pin;

use anyhow::Context;
use reqwest::header::{ETAG, IF_NONE_MATCH};
use reqwest::{Client, RequestBuilder, StatusCode};

use confsync_common::http::resolve_url;
use confsync_common::model::{Registration, RemoteConfig, AGENT_ID_HEADER, API_KEY_HEADER};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Classified answer to a conditional fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The agent's marker is current; no body.
    NotModified { marker: String },
    /// Success status. `config` is `None` when the body carried no payload.
    Fetched { config: Option<RemoteConfig>, marker: String },
}

/// Controller operations the sync loop depends on.
pub trait ControllerApi: Send + Sync {
    /// Register with a possibly empty prior identity.
    fn register<'a>(&'a self, agent_id: &'a str) -> BoxFuture<'a, anyhow::Result<Registration>>;

    /// Conditional GET of the current config at `poll_target`.
    fn fetch_config<'a>(
        &'a self,
        agent_id: &'a str,
        marker: &'a str,
        poll_target: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<FetchOutcome>>;
}

/// Worker operations the sync loop depends on.
pub trait WorkerApi: Send + Sync {
    fn apply_config<'a>(&'a self, config: &'a RemoteConfig) -> BoxFuture<'a, anyhow::Result<()>>;
}

/// Set a header only when it has a value.
fn with_header(req: RequestBuilder, name: &str, value: &str) -> RequestBuilder {
    if value.is_empty() {
        req
    } else {
        req.header(name, value)
    }
}

/// HTTP client for the controller.
pub struct HttpControllerClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl HttpControllerClient {
    pub fn new(base_url: String, api_key: String, client: Client) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_owned(), api_key, client }
    }

    async fn post_register(&self, agent_id: &str) -> anyhow::Result<Registration> {
        let req = self.client.post(format!("{}/register", self.base_url));
        let req = with_header(req, API_KEY_HEADER, &self.api_key);
        let req = with_header(req, AGENT_ID_HEADER, agent_id);
        let resp = req.send().await.context("register request")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("register failed with status {}", status.as_u16());
        }
        let reg = resp.json::<Registration>().await.context("decode register response")?;
        Ok(reg)
    }

    async fn get_config(
        &self,
        agent_id: &str,
        marker: &str,
        poll_target: &str,
    ) -> anyhow::Result<FetchOutcome> {
        let url = resolve_url(&self.base_url, poll_target);
        let req = self.client.get(&url);
        let req = with_header(req, API_KEY_HEADER, &self.api_key);
        let req = with_header(req, AGENT_ID_HEADER, agent_id);
        let req = with_header(req, IF_NONE_MATCH.as_str(), marker);
        let resp = req.send().await.with_context(|| format!("get config {url}"))?;

        let status = resp.status();
        let marker = resp
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();

        match status {
            StatusCode::NOT_MODIFIED => Ok(FetchOutcome::NotModified { marker }),
            StatusCode::OK => {
                let bytes = resp.bytes().await.context("read config response")?;
                let config = if bytes.iter().all(u8::is_ascii_whitespace) {
                    None
                } else {
                    serde_json::from_slice::<Option<RemoteConfig>>(&bytes)
                        .context("decode config response")?
                };
                Ok(FetchOutcome::Fetched { config, marker })
            }
            other => {
                anyhow::bail!("get config failed with status {} (etag {marker:?})", other.as_u16())
            }
        }
    }
}

impl ControllerApi for HttpControllerClient {
    fn register<'a>(&'a self, agent_id: &'a str) -> BoxFuture<'a, anyhow::Result<Registration>> {
        Box::pin(self.post_register(agent_id))
    }

    fn fetch_config<'a>(
        &'a self,
        agent_id: &'a str,
        marker: &'a str,
        poll_target: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<FetchOutcome>> {
        Box::pin(self.get_config(agent_id, marker, poll_target))
    }
}

/// HTTP client for the worker.
pub struct HttpWorkerClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl HttpWorkerClient {
    pub fn new(base_url: String, api_key: String, client: Client) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_owned(), api_key, client }
    }

    async fn post_config(&self, config: &RemoteConfig) -> anyhow::Result<()> {
        let req = self.client.post(format!("{}/config", self.base_url)).json(config);
        let req = with_header(req, API_KEY_HEADER, &self.api_key);
        let resp = req.send().await.context("worker apply request")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("worker apply failed with status {}", status.as_u16());
        }
        Ok(())
    }
}

impl WorkerApi for HttpWorkerClient {
    fn apply_config<'a>(&'a self, config: &'a RemoteConfig) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(self.post_config(config))
    }
}
