// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;

/// Configuration authority: registers agents and serves versioned configs.
#[derive(Debug, Clone, Parser)]
#[command(name = "confsync-controller", version, about)]
pub struct ControllerConfig {
    /// Host to bind on.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// API key required on `POST /config`.
    #[arg(long, env = "ADMIN_API_KEY", default_value = "")]
    pub admin_api_key: String,

    /// API key required on `POST /register` and `GET /config`.
    #[arg(long, env = "AGENT_API_KEY", default_value = "")]
    pub agent_api_key: String,

    /// Poll target handed to agents at registration.
    #[arg(long, env = "POLL_URL", default_value = "/config")]
    pub poll_url: String,

    /// Interval handed out while no config carries a positive one.
    #[arg(long, env = "DEFAULT_POLL_INTERVAL_SECONDS", default_value_t = 30)]
    pub default_poll_interval_seconds: i64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log format (json or text).
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: String,
}

impl ControllerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        let required = [
            ("ADMIN_API_KEY", self.admin_api_key.as_str()),
            ("AGENT_API_KEY", self.agent_api_key.as_str()),
            ("POLL_URL", self.poll_url.as_str()),
        ];
        let missing: Vec<&str> =
            required.iter().filter(|(_, v)| v.trim().is_empty()).map(|(k, _)| *k).collect();
        if !missing.is_empty() {
            anyhow::bail!("missing required settings: {}", missing.join(", "));
        }
        if self.default_poll_interval_seconds <= 0 {
            anyhow::bail!("invalid DEFAULT_POLL_INTERVAL_SECONDS: must be > 0");
        }
        Ok(())
    }
}
