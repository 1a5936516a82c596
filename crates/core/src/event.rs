// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instance lifecycle events, one line of which is appended to
//! `instances_events.log` (component I) per occurrence.

use serde::{Deserialize, Serialize};

use crate::registry::InstancePath;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum InstanceEvent {
    Started { path: String, pid: i32 },
    ForkFailed { path: String, reason: String },
    SigintSent { path: String },
    SigkillSent { path: String },
    Reaped { path: String },
    RestartLimitReached { path: String },
    Adopted { path: String, pid: i32 },
    Dialed { path: String },
    DialFailed { path: String, reason: String },
    Disconnected { path: String, reason: String },
}

impl InstanceEvent {
    pub fn started(path: &InstancePath, pid: i32) -> Self {
        Self::Started {
            path: path.to_string(),
            pid,
        }
    }

    pub fn fork_failed(path: &InstancePath, reason: impl Into<String>) -> Self {
        Self::ForkFailed {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub fn sigint_sent(path: &InstancePath) -> Self {
        Self::SigintSent {
            path: path.to_string(),
        }
    }

    pub fn sigkill_sent(path: &InstancePath) -> Self {
        Self::SigkillSent {
            path: path.to_string(),
        }
    }

    pub fn reaped(path: &InstancePath) -> Self {
        Self::Reaped {
            path: path.to_string(),
        }
    }

    pub fn restart_limit_reached(path: &InstancePath) -> Self {
        Self::RestartLimitReached {
            path: path.to_string(),
        }
    }

    pub fn adopted(path: &InstancePath, pid: i32) -> Self {
        Self::Adopted {
            path: path.to_string(),
            pid,
        }
    }

    pub fn dialed(path: &InstancePath) -> Self {
        Self::Dialed {
            path: path.to_string(),
        }
    }

    pub fn dial_failed(path: &InstancePath, reason: impl Into<String>) -> Self {
        Self::DialFailed {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub fn disconnected(path: &InstancePath, reason: impl Into<String>) -> Self {
        Self::Disconnected {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Render as a single JSON line suitable for `instances_events.log`.
    pub fn to_log_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{\"kind\":\"EncodeFailed\"}".to_string())
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
