// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire format for the worker control-socket protocol (component F).
//!
//! Every message is framed by a fixed 5-byte header: one byte command tag,
//! followed by a 4-byte little-endian `data_size`. This is pinned explicitly
//! byte-by-byte rather than serialized from an in-memory record, since the
//! padding of a packed struct is compiler-dependent (see design notes) and
//! workers on the other end of the socket are not Rust programs.

use thiserror::Error;

/// Length in bytes of the wire header: 1 (command) + 4 (little-endian size).
pub const HEADER_LEN: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("short header: expected {HEADER_LEN} bytes, got {0}")]
    ShortHeader(usize),
    #[error("unknown command tag: {0}")]
    UnknownCommand(u8),
    #[error("unexpected command: expected {expected:?}, got {actual:?}")]
    UnexpectedCommand {
        expected: CommandTag,
        actual: CommandTag,
    },
}

/// Command tags carried in the header's first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandTag {
    Get = 10,
    Set = 11,
    Ok = 12,
}

impl TryFrom<u8> for CommandTag {
    type Error = WireError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            10 => Ok(CommandTag::Get),
            11 => Ok(CommandTag::Set),
            12 => Ok(CommandTag::Ok),
            other => Err(WireError::UnknownCommand(other)),
        }
    }
}

impl From<CommandTag> for u8 {
    fn from(tag: CommandTag) -> Self {
        tag as u8
    }
}

/// The 5-byte frame header: command tag + payload length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub command: CommandTag,
    pub data_size: u32,
}

impl FrameHeader {
    pub fn new(command: CommandTag, data_size: u32) -> Self {
        Self {
            command,
            data_size,
        }
    }

    pub fn get(data_size: u32) -> Self {
        Self::new(CommandTag::Get, data_size)
    }

    /// Encode field-by-field into the exact 5-byte wire layout: no struct
    /// serialization, no implicit padding.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0] = self.command.into();
        buf[1..5].copy_from_slice(&self.data_size.to_le_bytes());
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.len() < HEADER_LEN {
            return Err(WireError::ShortHeader(bytes.len()));
        }
        let command = CommandTag::try_from(bytes[0])?;
        let mut size_buf = [0u8; 4];
        size_buf.copy_from_slice(&bytes[1..5]);
        let data_size = u32::from_le_bytes(size_buf);
        Ok(Self { command, data_size })
    }

    /// Decode and assert the command matches `expected`, as callers do when
    /// reading a reply they expect to be `OK`.
    pub fn decode_expecting(bytes: &[u8], expected: CommandTag) -> Result<Self, WireError> {
        let header = Self::decode(bytes)?;
        if header.command != expected {
            return Err(WireError::UnexpectedCommand {
                expected,
                actual: header.command,
            });
        }
        Ok(header)
    }
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
