// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end convergence: controller, agent, and worker over real TCP.

use std::time::Duration;

use confsync_specs::{
    free_port, publish, start_controller, start_worker, wait_for, wait_for_version, worker_config,
    Agent,
};

const TIMEOUT: Duration = Duration::from_secs(15);

#[tokio::test]
async fn published_config_reaches_worker() -> anyhow::Result<()> {
    let controller = start_controller(0, 1).await?;
    let worker = start_worker().await?;
    let dir = tempfile::tempdir()?;
    let agent = Agent::start(&controller.base_url(), &worker.base_url(), &dir.path().join("state.json"))?;

    let published = publish(&controller, "http://example.com/v1", 1).await?;
    let applied = wait_for_version(&worker, published.version, TIMEOUT).await?;
    assert_eq!(applied, published);

    let running = &agent;
    let state = wait_for(TIMEOUT, "agent to record version 1", move || async move {
        let s = running.snapshot().await;
        Ok((s.applied_version == 1).then_some(s))
    })
    .await?;
    assert_eq!(state.marker, "\"1\"");
    assert_eq!(state.config_url, "http://example.com/v1");
    assert!(!state.agent_id.is_empty());

    let persisted = agent.persisted()?;
    assert_eq!(persisted.applied_version, 1);
    assert_eq!(persisted.agent_id, state.agent_id);

    agent.stop().await
}

#[tokio::test]
async fn newer_version_replaces_older() -> anyhow::Result<()> {
    let controller = start_controller(0, 1).await?;
    let worker = start_worker().await?;
    let dir = tempfile::tempdir()?;
    let agent = Agent::start(&controller.base_url(), &worker.base_url(), &dir.path().join("state.json"))?;

    publish(&controller, "http://example.com/v1", 1).await?;
    wait_for_version(&worker, 1, TIMEOUT).await?;

    publish(&controller, "http://example.com/v2", 1).await?;
    let applied = wait_for_version(&worker, 2, TIMEOUT).await?;
    assert_eq!(applied.url, "http://example.com/v2");

    agent.stop().await
}

#[tokio::test]
async fn restart_rehydrates_fresh_worker_and_keeps_identity() -> anyhow::Result<()> {
    let controller = start_controller(0, 1).await?;
    let worker = start_worker().await?;
    let dir = tempfile::tempdir()?;
    let state_path = dir.path().join("nested").join("state.json");

    let agent = Agent::start(&controller.base_url(), &worker.base_url(), &state_path)?;
    publish(&controller, "http://example.com/v1", 1).await?;
    wait_for_version(&worker, 1, TIMEOUT).await?;
    let running = &agent;
    let identity = wait_for(TIMEOUT, "state file with version 1", move || async move {
        Ok(running.persisted().ok().filter(|s| s.applied_version == 1))
    })
    .await?
    .agent_id;
    agent.stop().await?;

    // The worker restarted and lost its config; the controller still answers
    // "unchanged" for the stored marker.
    let fresh = start_worker().await?;
    assert_eq!(worker_config(&fresh).await?, None);

    let agent = Agent::start(&controller.base_url(), &fresh.base_url(), &state_path)?;
    let applied = wait_for_version(&fresh, 1, TIMEOUT).await?;
    assert_eq!(applied.url, "http://example.com/v1");

    let running = &agent;
    let state = wait_for(TIMEOUT, "agent to finish bootstrap", move || async move {
        let s = running.snapshot().await;
        Ok((!s.agent_id.is_empty()).then_some(s))
    })
    .await?;
    assert_eq!(state.agent_id, identity);

    agent.stop().await
}

#[tokio::test]
async fn agent_converges_once_controller_comes_up() -> anyhow::Result<()> {
    let port = free_port()?;
    let worker = start_worker().await?;
    let dir = tempfile::tempdir()?;
    let agent = Agent::start(
        &format!("http://127.0.0.1:{port}"),
        &worker.base_url(),
        &dir.path().join("state.json"),
    )?;

    // Let the agent fail a few registrations first.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(agent.snapshot().await.agent_id.is_empty());

    let controller = start_controller(port, 1).await?;
    publish(&controller, "http://example.com/late", 1).await?;
    let applied = wait_for_version(&worker, 1, TIMEOUT).await?;
    assert_eq!(applied.url, "http://example.com/late");

    agent.stop().await
}

#[tokio::test]
async fn agent_keeps_polling_through_worker_outage() -> anyhow::Result<()> {
    let controller = start_controller(0, 1).await?;
    let worker = start_worker().await?;
    let dir = tempfile::tempdir()?;
    let agent = Agent::start(&controller.base_url(), &worker.base_url(), &dir.path().join("state.json"))?;

    publish(&controller, "http://example.com/v1", 1).await?;
    wait_for_version(&worker, 1, TIMEOUT).await?;

    // Forwarding to a stopped worker fails and is retried without caching.
    worker.stop();
    publish(&controller, "http://example.com/v2", 1).await?;
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(agent.snapshot().await.applied_version, 1);

    agent.stop().await
}
