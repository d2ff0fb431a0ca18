// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end convergence tests.
//!
//! Runs the real controller and worker routers on ephemeral TCP ports and
//! drives the real agent sync engine against them, all in-process.

use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use confsync_agent::backoff::BackoffPolicy;
use confsync_agent::client::{HttpControllerClient, HttpWorkerClient};
use confsync_agent::state::{StateHandle, SyncState};
use confsync_agent::store::FileStateStore;
use confsync_agent::sync::{SyncEngine, SyncSettings};
use confsync_common::auth::ApiKey;
use confsync_common::http::build_client;
use confsync_common::model::RemoteConfig;
use confsync_controller::config::ControllerConfig;
use confsync_controller::state::ControllerState;
use confsync_controller::store::{MemoryAgentRegistry, MemoryConfigStore};
use confsync_worker::fetch::HttpFetcher;
use confsync_worker::state::WorkerState;

pub const ADMIN_KEY: &str = "e2e-admin-key";
pub const AGENT_KEY: &str = "e2e-agent-key";
pub const WORKER_KEY: &str = "e2e-worker-key";

/// Find a free TCP port by binding to :0 then releasing.
pub fn free_port() -> anyhow::Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

fn serve(listener: TcpListener, router: axum::Router, cancel: CancellationToken) -> anyhow::Result<SocketAddr> {
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).with_graceful_shutdown(cancel.cancelled_owned()).await;
    });
    Ok(addr)
}

/// An in-process server that stops when dropped.
pub struct Server {
    addr: SocketAddr,
    cancel: CancellationToken,
}

impl Server {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Start a controller with in-memory stores. `port` 0 picks a free one.
pub async fn start_controller(port: u16, default_poll_interval_seconds: i64) -> anyhow::Result<Server> {
    let config = ControllerConfig {
        host: "127.0.0.1".to_owned(),
        port,
        admin_api_key: ADMIN_KEY.to_owned(),
        agent_api_key: AGENT_KEY.to_owned(),
        poll_url: "/config".to_owned(),
        default_poll_interval_seconds,
        log_level: "info".to_owned(),
        log_format: "text".to_owned(),
    };
    let state = Arc::new(ControllerState::new(
        &config,
        Arc::new(MemoryConfigStore::new()),
        Arc::new(MemoryAgentRegistry::new()),
    ));
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    let cancel = CancellationToken::new();
    let addr = serve(listener, confsync_controller::transport::build_router(state), cancel.clone())?;
    Ok(Server { addr, cancel })
}

/// Start an empty worker.
pub async fn start_worker() -> anyhow::Result<Server> {
    let fetcher = HttpFetcher::new(build_client(Duration::from_secs(5))?);
    let state = Arc::new(WorkerState::new(ApiKey::new(WORKER_KEY), fetcher));
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let cancel = CancellationToken::new();
    let addr = serve(listener, confsync_worker::transport::build_router(state), cancel.clone())?;
    Ok(Server { addr, cancel })
}

/// Publish a new config through the admin API.
pub async fn publish(controller: &Server, url: &str, poll_interval_seconds: i64) -> anyhow::Result<RemoteConfig> {
    let resp = build_client(Duration::from_secs(5))?
        .post(format!("{}/config", controller.base_url()))
        .header("x-api-key", ADMIN_KEY)
        .json(&serde_json::json!({"url": url, "poll_interval_seconds": poll_interval_seconds}))
        .send()
        .await?;
    anyhow::ensure!(resp.status().as_u16() == 201, "publish failed with status {}", resp.status());
    Ok(resp.json().await?)
}

/// The worker's current config, or `None` while it has none.
pub async fn worker_config(worker: &Server) -> anyhow::Result<Option<RemoteConfig>> {
    let resp = build_client(Duration::from_secs(5))?
        .get(format!("{}/state", worker.base_url()))
        .send()
        .await?;
    if resp.status().as_u16() == 404 {
        return Ok(None);
    }
    anyhow::ensure!(resp.status().is_success(), "worker state failed with status {}", resp.status());
    Ok(Some(resp.json().await?))
}

/// Poll `check` until it yields `Some` or `timeout` elapses.
pub async fn wait_for<T, F, Fut>(timeout: Duration, what: &str, mut check: F) -> anyhow::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<Option<T>>>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Some(value) = check().await? {
            return Ok(value);
        }
        if tokio::time::Instant::now() > deadline {
            anyhow::bail!("timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

/// Wait until the worker holds `version`.
pub async fn wait_for_version(worker: &Server, version: i64, timeout: Duration) -> anyhow::Result<RemoteConfig> {
    wait_for(timeout, &format!("worker to hold version {version}"), move || async move {
        Ok(worker_config(worker).await?.filter(|c| c.version == version))
    })
    .await
}

/// A running agent sync engine that is cancelled on drop.
pub struct Agent {
    handle: StateHandle,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    state_path: PathBuf,
}

impl Agent {
    /// Start an agent with one-second defaults and a two-second backoff cap.
    pub fn start(controller_url: &str, worker_url: &str, state_path: &Path) -> anyhow::Result<Self> {
        let http = build_client(Duration::from_secs(2))?;
        let controller =
            HttpControllerClient::new(controller_url.to_owned(), AGENT_KEY.to_owned(), http.clone());
        let worker = HttpWorkerClient::new(worker_url.to_owned(), WORKER_KEY.to_owned(), http);
        let settings = SyncSettings {
            default_poll_target: "/config".to_owned(),
            default_poll_interval_secs: 1,
            backoff: BackoffPolicy { max_backoff: Duration::from_secs(2), jitter_percent: 0 },
        };
        let engine = SyncEngine::new(
            Arc::new(controller),
            Arc::new(worker),
            Arc::new(FileStateStore::new(state_path)),
            settings,
        );
        let handle = engine.handle();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(engine.run(cancel.clone()));
        Ok(Self { handle, cancel, task: Some(task), state_path: state_path.to_owned() })
    }

    pub async fn snapshot(&self) -> SyncState {
        self.handle.snapshot().await
    }

    /// What the agent last wrote to disk.
    pub fn persisted(&self) -> anyhow::Result<SyncState> {
        let contents = std::fs::read_to_string(&self.state_path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Cancel the engine and wait for it to finish.
    pub async fn stop(mut self) -> anyhow::Result<()> {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            tokio::time::timeout(Duration::from_secs(5), task).await??;
        }
        Ok(())
    }
}

impl Drop for Agent {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
