// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

/// Where a sync step failed. Drives which retry path the loop takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Register or fetch against the controller.
    Controller,
    /// Forwarding a config to the worker.
    Worker,
    /// Loading or saving local state.
    Local,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Controller => "controller",
            Self::Worker => "worker",
            Self::Local => "local",
        }
    }

    /// Whether failures of this kind are retried with backoff.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Controller | Self::Worker)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified sync failure.
#[derive(Debug)]
pub struct SyncError {
    kind: FailureKind,
    source: anyhow::Error,
}

pub type SyncResult<T> = Result<T, SyncError>;

impl SyncError {
    pub fn new(kind: FailureKind, source: anyhow::Error) -> Self {
        Self { kind, source }
    }

    pub fn controller(source: anyhow::Error) -> Self {
        Self::new(FailureKind::Controller, source)
    }

    pub fn worker(source: anyhow::Error) -> Self {
        Self::new(FailureKind::Worker, source)
    }

    pub fn local(source: anyhow::Error) -> Self {
        Self::new(FailureKind::Local, source)
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failure: {:#}", self.kind, self.source)
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}
