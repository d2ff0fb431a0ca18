// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conditional config responses keyed on the config version.

use confsync_common::model::RemoteConfig;

/// Canonical marker for a config version: the decimal version in quotes.
pub fn canonical_marker(version: i64) -> String {
    format!("\"{version}\"")
}

/// Strip surrounding whitespace, an optional weak-validator prefix (`W/` or
/// `w/`), and surrounding quotes.
pub fn normalize(marker: &str) -> &str {
    let mut v = marker.trim();
    if let Some(rest) = v.strip_prefix("W/").or_else(|| v.strip_prefix("w/")) {
        v = rest.trim();
    }
    v.trim_matches('"')
}

/// Whether any entry of a comma-separated `If-None-Match` value names `current`.
pub fn if_none_match_contains(header: &str, current: &str) -> bool {
    if header.is_empty() || current.is_empty() {
        return false;
    }
    let current = normalize(current);
    header.split(',').any(|candidate| normalize(candidate) == current)
}

/// Answer to a conditional config read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionalResponse {
    /// The client already holds this version. No body.
    NotModified { marker: String },
    Full { config: RemoteConfig, marker: String },
}

impl ConditionalResponse {
    pub fn marker(&self) -> &str {
        match self {
            Self::NotModified { marker } | Self::Full { marker, .. } => marker,
        }
    }
}

/// Decide between "unchanged" and a full body for `config`.
pub fn respond(config: &RemoteConfig, if_none_match: Option<&str>) -> ConditionalResponse {
    let marker = canonical_marker(config.version);
    if if_none_match.is_some_and(|h| if_none_match_contains(h, &marker)) {
        ConditionalResponse::NotModified { marker }
    } else {
        ConditionalResponse::Full { config: config.clone(), marker }
    }
}

#[cfg(test)]
#[path = "conditional_tests.rs"]
mod tests;
