// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound HTTP client construction.

use std::sync::Once;
use std::time::Duration;

static CRYPTO_INIT: Once = Once::new();

/// Install the ring crypto provider for reqwest/rustls.
/// Only the first call has effect.
pub fn ensure_crypto() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Build a reqwest client whose every request is bounded by `timeout`.
pub fn build_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    ensure_crypto();
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(client)
}

/// Join a base URL and a path, or return `target` unchanged when it is
/// already an absolute http(s) URL.
pub fn resolve_url(base: &str, target: &str) -> String {
    if target.starts_with("http://") || target.starts_with("https://") {
        return target.to_owned();
    }
    let base = base.trim_end_matches('/');
    if target.is_empty() {
        return base.to_owned();
    }
    if target.starts_with('/') {
        format!("{base}{target}")
    } else {
        format!("{base}/{target}")
    }
}
