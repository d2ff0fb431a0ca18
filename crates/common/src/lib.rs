// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pieces shared by the controller, agent, and worker: the wire contract,
//! the error envelope, API-key auth, and process plumbing.

pub mod auth;
pub mod error;
pub mod http;
pub mod model;
pub mod shutdown;
pub mod telemetry;
