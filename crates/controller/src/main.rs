// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tracing::error;

use confsync_common::telemetry::init_tracing;
use confsync_controller::config::ControllerConfig;

#[tokio::main]
async fn main() {
    let config = ControllerConfig::parse();

    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }

    init_tracing(&config.log_level, &config.log_format);

    if let Err(e) = confsync_controller::run(config).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}
