// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON schema for the stats-response payload (component F) and the logic
//! that applies it onto a [`crate::model::Instance`]'s configured interfaces.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Instance;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputIfcStats {
    pub ifc_id: String,
    pub messages: u64,
    pub buffers: u64,
    pub ifc_type: u8,
    pub ifc_state: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputIfcStats {
    pub ifc_id: String,
    #[serde(rename = "sent-messages")]
    pub sent_messages: u64,
    #[serde(rename = "dropped-messages")]
    pub dropped_messages: u64,
    pub buffers: u64,
    pub autoflushes: u64,
    pub num_clients: u32,
    #[serde(rename = "type")]
    pub ifc_type: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsPayload {
    pub in_cnt: usize,
    pub out_cnt: usize,
    #[serde(rename = "in")]
    pub in_stats: Vec<InputIfcStats>,
    #[serde(rename = "out")]
    pub out_stats: Vec<OutputIfcStats>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatsApplyError {
    #[error("in_cnt mismatch: configured {configured}, reported {reported}")]
    InCountMismatch { configured: usize, reported: usize },
    #[error("out_cnt mismatch: configured {configured}, reported {reported}")]
    OutCountMismatch { configured: usize, reported: usize },
    #[error("in array carries {reported} elements but only {configured} are configured")]
    InArrayOverflow { configured: usize, reported: usize },
    #[error("out array carries {reported} elements but only {configured} are configured")]
    OutArrayOverflow { configured: usize, reported: usize },
}

/// Apply a parsed stats payload onto `instance`'s configured interfaces.
///
/// Enforces invariant I3: a count mismatch (declared `in_cnt`/`out_cnt`
/// disagreeing with the configured interface count, or an array longer than
/// declared) leaves the instance entirely unchanged — no partial update.
pub fn apply_stats(instance: &mut Instance, payload: &StatsPayload) -> Result<(), StatsApplyError> {
    let configured_in = instance.input_interfaces.len();
    let configured_out = instance.output_interfaces.len();

    if payload.in_cnt != configured_in {
        return Err(StatsApplyError::InCountMismatch {
            configured: configured_in,
            reported: payload.in_cnt,
        });
    }
    if payload.out_cnt != configured_out {
        return Err(StatsApplyError::OutCountMismatch {
            configured: configured_out,
            reported: payload.out_cnt,
        });
    }
    if payload.in_stats.len() > configured_in {
        return Err(StatsApplyError::InArrayOverflow {
            configured: configured_in,
            reported: payload.in_stats.len(),
        });
    }
    if payload.out_stats.len() > configured_out {
        return Err(StatsApplyError::OutArrayOverflow {
            configured: configured_out,
            reported: payload.out_stats.len(),
        });
    }

    for (slot, reported) in instance
        .input_interfaces
        .iter_mut()
        .zip(payload.in_stats.iter())
    {
        slot.id = reported.ifc_id.clone();
        slot.ifc_type = reported.ifc_type;
        slot.ifc_state = reported.ifc_state;
        slot.recv_msg = reported.messages;
        slot.recv_buf = reported.buffers;
    }

    for (slot, reported) in instance
        .output_interfaces
        .iter_mut()
        .zip(payload.out_stats.iter())
    {
        slot.id = reported.ifc_id.clone();
        slot.ifc_type = reported.ifc_type;
        slot.sent_msg = reported.sent_messages;
        slot.sent_buf = reported.buffers;
        slot.dropped_msg = reported.dropped_messages;
        slot.autoflush = reported.autoflushes;
        slot.num_clients = reported.num_clients;
    }

    Ok(())
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;
