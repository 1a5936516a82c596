// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine crate (process management, sampling, protocol).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("fork/exec failed for {path}: {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("signal delivery failed for pid {pid}: {source}")]
    Signal {
        pid: i32,
        #[source]
        source: nix::Error,
    },
    #[error("host accounting surface unreadable: {0}")]
    AccountingSurface(String),
    #[error("dial failed for {path}: {source}")]
    Dial {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Wire(#[from] sv_core::WireError),
    #[error("protocol timeout waiting for {path}")]
    ProtocolTimeout { path: String },
    #[error("protocol I/O error for {path}: {source}")]
    ProtocolIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("connection closed by {path}")]
    ConnectionClosed { path: String },
    #[error("JSON decode failed for {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    StatsApply(#[from] sv_core::stats::StatsApplyError),
}
