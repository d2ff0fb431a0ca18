// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use clap::Parser;

/// Holds the configuration forwarded by the agent and acts on it.
#[derive(Debug, Clone, Parser)]
#[command(name = "confsync-worker", version, about)]
pub struct WorkerConfig {
    /// Host to bind on.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8082)]
    pub port: u16,

    /// API key required on `POST /config`.
    #[arg(long, env = "AGENT_API_KEY", default_value = "")]
    pub agent_api_key: String,

    /// Timeout for the `/hit` upstream request.
    #[arg(long, env = "REQUEST_TIMEOUT_SECONDS", default_value_t = 10)]
    pub request_timeout_seconds: i64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log format (json or text).
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: String,
}

impl WorkerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.agent_api_key.trim().is_empty() {
            anyhow::bail!("missing required settings: AGENT_API_KEY");
        }
        if self.request_timeout_seconds <= 0 {
            anyhow::bail!("invalid REQUEST_TIMEOUT_SECONDS: must be > 0");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds.max(1).unsigned_abs())
    }
}
