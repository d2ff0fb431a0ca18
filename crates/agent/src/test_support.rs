// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory fakes for the controller, worker, and state store.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use confsync_common::model::{Registration, RemoteConfig};

use crate::client::{BoxFuture, ControllerApi, FetchOutcome, WorkerApi};
use crate::state::SyncState;
use crate::store::StateStore;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Cancels a token once a fake has served its whole script.
#[derive(Default)]
struct StopWhenDrained(Mutex<Option<CancellationToken>>);

impl StopWhenDrained {
    fn set(&self, token: CancellationToken) {
        *lock(&self.0) = Some(token);
    }

    fn fire_if(&self, drained: bool) {
        if drained {
            if let Some(token) = lock(&self.0).as_ref() {
                token.cancel();
            }
        }
    }
}

/// A fetch call as seen by the fake controller.
#[derive(Debug, Clone)]
pub struct FetchCall {
    pub agent_id: String,
    pub marker: String,
    pub poll_target: String,
    pub at: Instant,
}

/// Scripted controller. Unscripted fetches answer "not modified" and
/// unscripted registrations hand out `A1`.
#[derive(Default)]
pub struct FakeController {
    registrations: Mutex<VecDeque<anyhow::Result<Registration>>>,
    fetches: Mutex<VecDeque<anyhow::Result<FetchOutcome>>>,
    register_calls: Mutex<Vec<(String, Instant)>>,
    fetch_calls: Mutex<Vec<FetchCall>>,
    stop: StopWhenDrained,
}

impl FakeController {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_registration(&self, reg: anyhow::Result<Registration>) {
        lock(&self.registrations).push_back(reg);
    }

    pub fn push_fetch(&self, outcome: anyhow::Result<FetchOutcome>) {
        lock(&self.fetches).push_back(outcome);
    }

    /// Cancel `token` on the first fetch after the script runs out.
    pub fn stop_when_drained(&self, token: CancellationToken) {
        self.stop.set(token);
    }

    pub fn register_calls(&self) -> Vec<(String, Instant)> {
        lock(&self.register_calls).clone()
    }

    pub fn fetch_calls(&self) -> Vec<FetchCall> {
        lock(&self.fetch_calls).clone()
    }
}

impl ControllerApi for FakeController {
    fn register<'a>(&'a self, agent_id: &'a str) -> BoxFuture<'a, anyhow::Result<Registration>> {
        Box::pin(async move {
            lock(&self.register_calls).push((agent_id.to_owned(), Instant::now()));
            lock(&self.registrations).pop_front().unwrap_or_else(|| Ok(registration("A1")))
        })
    }

    fn fetch_config<'a>(
        &'a self,
        agent_id: &'a str,
        marker: &'a str,
        poll_target: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<FetchOutcome>> {
        Box::pin(async move {
            lock(&self.fetch_calls).push(FetchCall {
                agent_id: agent_id.to_owned(),
                marker: marker.to_owned(),
                poll_target: poll_target.to_owned(),
                at: Instant::now(),
            });
            let next = lock(&self.fetches).pop_front();
            self.stop.fire_if(next.is_none());
            next.unwrap_or_else(|| Ok(FetchOutcome::NotModified { marker: marker.to_owned() }))
        })
    }
}

/// Scripted worker. Unscripted applies succeed.
#[derive(Default)]
pub struct FakeWorker {
    results: Mutex<VecDeque<anyhow::Result<()>>>,
    applied: Mutex<Vec<RemoteConfig>>,
    attempts: Mutex<usize>,
}

impl FakeWorker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_result(&self, result: anyhow::Result<()>) {
        lock(&self.results).push_back(result);
    }

    /// Configs the worker accepted.
    pub fn applied(&self) -> Vec<RemoteConfig> {
        lock(&self.applied).clone()
    }

    pub fn attempts(&self) -> usize {
        *lock(&self.attempts)
    }
}

impl WorkerApi for FakeWorker {
    fn apply_config<'a>(&'a self, config: &'a RemoteConfig) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            *lock(&self.attempts) += 1;
            let result = lock(&self.results).pop_front().unwrap_or(Ok(()));
            if result.is_ok() {
                lock(&self.applied).push(config.clone());
            }
            result
        })
    }
}

/// State store held in memory with injectable load/save failures.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<Option<SyncState>>,
    load_plan: Mutex<VecDeque<bool>>,
    save_errors: Mutex<usize>,
    saves: Mutex<Vec<SyncState>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_state(state: SyncState) -> Arc<Self> {
        let store = Self::default();
        *lock(&store.state) = Some(state);
        Arc::new(store)
    }

    /// Fail the next `n` loads.
    pub fn fail_loads(&self, n: usize) {
        lock(&self.load_plan).extend(std::iter::repeat(true).take(n));
    }

    /// Script upcoming loads: `true` fails that attempt. Loads past the
    /// script succeed.
    pub fn script_loads(&self, plan: &[bool]) {
        lock(&self.load_plan).extend(plan.iter().copied());
    }

    /// Fail the next `n` saves.
    pub fn fail_saves(&self, n: usize) {
        *lock(&self.save_errors) = n;
    }

    pub fn stored(&self) -> Option<SyncState> {
        lock(&self.state).clone()
    }

    /// Every successfully saved state, in order.
    pub fn saves(&self) -> Vec<SyncState> {
        lock(&self.saves).clone()
    }
}

fn take_failure(counter: &Mutex<usize>) -> bool {
    let mut n = lock(counter);
    if *n > 0 {
        *n -= 1;
        true
    } else {
        false
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> anyhow::Result<SyncState> {
        if lock(&self.load_plan).pop_front().unwrap_or(false) {
            anyhow::bail!("injected load failure");
        }
        Ok(lock(&self.state).clone().unwrap_or_default())
    }

    fn save(&self, state: &SyncState) -> anyhow::Result<()> {
        if take_failure(&self.save_errors) {
            anyhow::bail!("injected save failure");
        }
        *lock(&self.state) = Some(state.clone());
        lock(&self.saves).push(state.clone());
        Ok(())
    }
}

pub fn registration(agent_id: &str) -> Registration {
    Registration {
        agent_id: agent_id.to_owned(),
        poll_url: "/config".to_owned(),
        poll_interval_seconds: 30,
    }
}

pub fn fetched(version: i64, url: &str, interval: i64, marker: &str) -> FetchOutcome {
    FetchOutcome::Fetched {
        config: Some(RemoteConfig {
            version,
            url: url.to_owned(),
            poll_interval_seconds: interval,
        }),
        marker: marker.to_owned(),
    }
}

/// Assert that an expression is `Err` and its message contains a substring.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = format!("{err:#}");
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}
