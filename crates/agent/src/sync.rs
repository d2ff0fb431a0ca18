// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent sync loop: bootstrap once, then poll the controller and forward
//! new configs to the worker until shutdown.
//!
//! Controller and worker failures back off per target. Local state failures
//! retry on a fixed interval and never touch the backoff counter. The live
//! state is owned by the loop; readers get copies through [`StateHandle`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backoff::{Backoff, BackoffPolicy};
use crate::client::{ControllerApi, FetchOutcome, WorkerApi};
use crate::error::{FailureKind, SyncError, SyncResult};
use crate::state::{StateHandle, SyncState};
use crate::store::StateStore;

/// Interval used for local retries when the default poll interval is unusable.
const FALLBACK_LOCAL_RETRY: Duration = Duration::from_secs(5);

/// Static tuning for a sync loop.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub default_poll_target: String,
    pub default_poll_interval_secs: i64,
    pub backoff: BackoffPolicy,
}

impl SyncSettings {
    /// Fixed wait after a local failure during bootstrap.
    pub fn local_retry_interval(&self) -> Duration {
        positive_secs(self.default_poll_interval_secs).unwrap_or(FALLBACK_LOCAL_RETRY)
    }
}

fn positive_secs(secs: i64) -> Option<Duration> {
    u64::try_from(secs).ok().filter(|s| *s > 0).map(Duration::from_secs)
}

/// What one poll iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    NotModified,
    /// Success status without a payload; treated like "unchanged".
    EmptyPayload,
    Applied { version: i64 },
}

/// Sleep for `delay`. Returns false if `cancel` fired first.
async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

/// Run a remote call unless `cancel` fires first; a cancelled token never
/// lets the call start.
async fn guarded<T>(
    cancel: &CancellationToken,
    kind: FailureKind,
    call: impl Future<Output = anyhow::Result<T>>,
) -> SyncResult<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SyncError::new(kind, anyhow::anyhow!("cancelled"))),
        res = call => res.map_err(|e| SyncError::new(kind, e)),
    }
}

/// Single-owner sync state machine for one agent identity.
pub struct SyncEngine {
    controller: Arc<dyn ControllerApi>,
    worker: Arc<dyn WorkerApi>,
    store: Arc<dyn StateStore>,
    settings: SyncSettings,
    backoff: Backoff,
    state: SyncState,
    /// Set when an applied config has not reached disk yet.
    pending_persist: bool,
    handle: StateHandle,
}

impl SyncEngine {
    pub fn new(
        controller: Arc<dyn ControllerApi>,
        worker: Arc<dyn WorkerApi>,
        store: Arc<dyn StateStore>,
        settings: SyncSettings,
    ) -> Self {
        let state = SyncState::with_defaults(
            &settings.default_poll_target,
            settings.default_poll_interval_secs,
        );
        Self {
            controller,
            worker,
            store,
            backoff: Backoff::new(settings.backoff),
            handle: StateHandle::new(state.clone()),
            state,
            settings,
            pending_persist: false,
        }
    }

    /// Replace the backoff generator (e.g. with a seeded one).
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Read-only view of the live state for reporting.
    pub fn handle(&self) -> StateHandle {
        self.handle.clone()
    }

    /// Bootstrap, then poll until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        let policy = self.backoff.policy();
        info!(
            default_poll_secs = self.settings.default_poll_interval_secs,
            max_backoff_secs = policy.max_backoff.as_secs(),
            backoff_jitter_pct = policy.jitter_percent,
            "agent sync started"
        );

        if self.bootstrap_until_ready(&cancel).await {
            self.poll_loop(&cancel).await;
        }
        info!("agent sync stopped");
    }

    /// Retry bootstrap until it succeeds once. Returns false on cancellation.
    async fn bootstrap_until_ready(&mut self, cancel: &CancellationToken) -> bool {
        loop {
            if cancel.is_cancelled() {
                return false;
            }

            let err = match self.bootstrap(cancel).await {
                Ok(state) => {
                    self.backoff.reset();
                    self.state = state;
                    self.publish().await;
                    info!(
                        agent_id = %self.state.agent_id,
                        poll_url = %self.state.poll_target,
                        poll_interval_secs = self.state.poll_interval_secs,
                        etag = %self.state.marker,
                        "bootstrap completed"
                    );
                    return true;
                }
                Err(_) if cancel.is_cancelled() => return false,
                Err(e) => e,
            };

            let delay = if err.kind().is_remote() {
                let delay = self.backoff.next_delay(err.kind().as_str());
                warn!(
                    failure = %err.kind(),
                    retry_count = self.backoff.retry_state().failure_count(),
                    delay_ms = delay.as_millis() as u64,
                    err = %err,
                    "bootstrap failed, retry scheduled"
                );
                delay
            } else {
                let delay = self.settings.local_retry_interval();
                warn!(
                    failure = %err.kind(),
                    delay_ms = delay.as_millis() as u64,
                    err = %err,
                    "bootstrap failed locally, fixed retry scheduled"
                );
                delay
            };

            if !sleep_or_cancel(delay, cancel).await {
                return false;
            }
        }
    }

    /// One bootstrap attempt: load, repair, rehydrate the worker, register,
    /// persist. Returns the state to go live with.
    async fn bootstrap(&mut self, cancel: &CancellationToken) -> SyncResult<SyncState> {
        debug!("bootstrap started");

        let mut state = self.store.load().map_err(SyncError::local)?;
        if let Some(stale) = state.repair() {
            warn!(old_etag = %stale, "state has etag without config url, forcing full fetch");
        }
        info!(
            agent_id = %state.agent_id,
            config_url = %state.config_url,
            poll_url = %state.poll_target,
            poll_interval_secs = state.poll_interval_secs,
            etag = %state.marker,
            last_config_version = state.applied_version,
            "state loaded"
        );
        state.fill_defaults(
            &self.settings.default_poll_target,
            self.settings.default_poll_interval_secs,
        );

        // The worker may have restarted independently; give it the last
        // known config before talking to the controller.
        if let Some(cached) = state.cached_config() {
            guarded(cancel, FailureKind::Worker, self.worker.apply_config(&cached)).await?;
            info!(
                version = cached.version,
                url = %cached.url,
                poll_interval_secs = cached.poll_interval_seconds,
                "worker rehydrated from local state"
            );
        }

        let reg =
            guarded(cancel, FailureKind::Controller, self.controller.register(&state.agent_id))
                .await?;
        info!(
            agent_id = %reg.agent_id,
            poll_url = %reg.poll_url,
            poll_interval_secs = reg.poll_interval_seconds,
            "registered with controller"
        );
        state.adopt_registration(&reg);

        self.store.save(&state).map_err(SyncError::local)?;
        debug!(agent_id = %state.agent_id, "state saved");
        Ok(state)
    }

    async fn poll_loop(&mut self, cancel: &CancellationToken) {
        loop {
            if cancel.is_cancelled() {
                return;
            }

            match self.poll_once(cancel).await {
                Ok(outcome) => debug!(?outcome, "poll completed"),
                Err(_) if cancel.is_cancelled() => return,
                Err(err) if err.kind().is_remote() => {
                    let delay = self.backoff.next_delay(err.kind().as_str());
                    warn!(
                        failure = %err.kind(),
                        retry_count = self.backoff.retry_state().failure_count(),
                        delay_ms = delay.as_millis() as u64,
                        err = %err,
                        "poll failed, retry scheduled"
                    );
                    if !sleep_or_cancel(delay, cancel).await {
                        return;
                    }
                    continue;
                }
                Err(err) => {
                    // The worker already has the config; keep it and retry the
                    // save on the next successful iteration.
                    warn!(
                        failure = %err.kind(),
                        delay_ms = self.poll_interval().as_millis() as u64,
                        err = %err,
                        "state persistence failed after apply"
                    );
                }
            }

            self.backoff.reset();
            let interval = self.poll_interval();
            debug!(sleep_secs = interval.as_secs(), "next poll scheduled");
            if !sleep_or_cancel(interval, cancel).await {
                return;
            }
        }
    }

    /// One fetch-forward-persist cycle.
    async fn poll_once(&mut self, cancel: &CancellationToken) -> SyncResult<PollOutcome> {
        debug!(
            agent_id = %self.state.agent_id,
            poll_url = %self.state.poll_target,
            etag = %self.state.marker,
            "poll started"
        );

        let fetched = guarded(
            cancel,
            FailureKind::Controller,
            self.controller.fetch_config(
                &self.state.agent_id,
                &self.state.marker,
                &self.state.poll_target,
            ),
        )
        .await?;

        let (config, marker) = match fetched {
            FetchOutcome::NotModified { marker } => {
                debug!(etag = %marker, "config not modified");
                self.flush_pending()?;
                return Ok(PollOutcome::NotModified);
            }
            FetchOutcome::Fetched { config: None, marker } => {
                warn!(etag = %marker, "controller returned success without a config payload");
                self.flush_pending()?;
                return Ok(PollOutcome::EmptyPayload);
            }
            FetchOutcome::Fetched { config: Some(config), marker } => (config, marker),
        };
        info!(
            version = config.version,
            url = %config.url,
            poll_interval_secs = config.poll_interval_seconds,
            "config received"
        );

        guarded(cancel, FailureKind::Worker, self.worker.apply_config(&config)).await?;
        info!(version = config.version, "config forwarded to worker");

        self.state.record_applied(&config, &marker);
        self.pending_persist = true;
        self.publish().await;
        self.flush_pending()?;
        Ok(PollOutcome::Applied { version: config.version })
    }

    /// Save the live state if an earlier save did not land.
    fn flush_pending(&mut self) -> SyncResult<()> {
        if !self.pending_persist {
            return Ok(());
        }
        self.store.save(&self.state).map_err(SyncError::local)?;
        self.pending_persist = false;
        info!(
            agent_id = %self.state.agent_id,
            config_url = %self.state.config_url,
            etag = %self.state.marker,
            last_config_version = self.state.applied_version,
            poll_interval_secs = self.state.poll_interval_secs,
            "state saved"
        );
        Ok(())
    }

    fn poll_interval(&self) -> Duration {
        positive_secs(self.state.poll_interval_secs)
            .or_else(|| positive_secs(self.settings.default_poll_interval_secs))
            .unwrap_or(FALLBACK_LOCAL_RETRY)
    }

    async fn publish(&self) {
        self.handle.publish(self.state.clone()).await;
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
