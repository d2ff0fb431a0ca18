// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

use crate::backoff::{BackoffPolicy, MAX_JITTER_PERCENT};
use crate::sync::SyncSettings;

/// Polls the controller for configuration and forwards it to the worker.
#[derive(Debug, Clone, Parser)]
#[command(name = "confsync-agent", version, about)]
pub struct AgentConfig {
    /// Host for the observability endpoint.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port for the observability endpoint.
    #[arg(long, env = "PORT", default_value_t = 8081)]
    pub port: u16,

    /// Controller base URL (e.g. http://controller:8080).
    #[arg(long, env = "CONTROLLER_BASE_URL", default_value = "")]
    pub controller_base_url: String,

    /// API key presented to the controller.
    #[arg(long, env = "CONTROLLER_API_KEY", default_value = "")]
    pub controller_api_key: String,

    /// Worker base URL.
    #[arg(long, env = "WORKER_BASE_URL", default_value = "")]
    pub worker_base_url: String,

    /// API key presented to the worker.
    #[arg(long, env = "WORKER_API_KEY", default_value = "")]
    pub worker_api_key: String,

    /// Poll target used until the controller assigns one.
    #[arg(long, env = "POLL_URL", default_value = "/config")]
    pub poll_url: String,

    /// Poll interval used until the controller assigns one.
    #[arg(long, env = "POLL_INTERVAL_SECONDS", default_value_t = 30)]
    pub poll_interval_seconds: i64,

    /// Path of the durable state file.
    #[arg(long, env = "STATE_PATH")]
    pub state_path: Option<PathBuf>,

    /// Upper bound for remote retry delays.
    #[arg(long, env = "MAX_BACKOFF_SECONDS", default_value_t = 60)]
    pub max_backoff_seconds: i64,

    /// Random spread applied to retry delays, in percent.
    #[arg(long, env = "BACKOFF_JITTER_PERCENT", default_value_t = 20)]
    pub backoff_jitter_percent: i64,

    /// Timeout for each outbound request.
    #[arg(long, env = "REQUEST_TIMEOUT_SECONDS", default_value_t = 10)]
    pub request_timeout_seconds: i64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log format (json or text).
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: String,
}

impl AgentConfig {
    /// Reject missing settings and out-of-range numbers before start-up.
    pub fn validate(&self) -> anyhow::Result<()> {
        let required = [
            ("CONTROLLER_BASE_URL", self.controller_base_url.as_str()),
            ("CONTROLLER_API_KEY", self.controller_api_key.as_str()),
            ("WORKER_BASE_URL", self.worker_base_url.as_str()),
            ("WORKER_API_KEY", self.worker_api_key.as_str()),
            ("POLL_URL", self.poll_url.as_str()),
        ];
        let mut missing: Vec<&str> =
            required.iter().filter(|(_, v)| v.trim().is_empty()).map(|(k, _)| *k).collect();
        if self.state_path().is_none() {
            missing.push("STATE_PATH");
        }
        if !missing.is_empty() {
            anyhow::bail!("missing required settings: {}", missing.join(", "));
        }

        if self.poll_interval_seconds <= 0 {
            anyhow::bail!("invalid POLL_INTERVAL_SECONDS: must be > 0");
        }
        if self.max_backoff_seconds <= 0 {
            anyhow::bail!("invalid MAX_BACKOFF_SECONDS: must be > 0");
        }
        if !(0..=i64::from(MAX_JITTER_PERCENT)).contains(&self.backoff_jitter_percent) {
            anyhow::bail!("invalid BACKOFF_JITTER_PERCENT: must be between 0 and {MAX_JITTER_PERCENT}");
        }
        if self.request_timeout_seconds <= 0 {
            anyhow::bail!("invalid REQUEST_TIMEOUT_SECONDS: must be > 0");
        }
        Ok(())
    }

    /// The state file path, when one was given.
    pub fn state_path(&self) -> Option<&Path> {
        self.state_path.as_deref().filter(|p| !p.as_os_str().is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds.max(1).unsigned_abs())
    }

    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            default_poll_target: self.poll_url.clone(),
            default_poll_interval_secs: self.poll_interval_seconds,
            backoff: BackoffPolicy {
                max_backoff: Duration::from_secs(self.max_backoff_seconds.max(1).unsigned_abs()),
                jitter_percent: u32::try_from(self.backoff_jitter_percent).unwrap_or(0),
            },
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
