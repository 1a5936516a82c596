// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stats Protocol Client (component F): framed GET/OK exchange over a
//! non-blocking Unix-domain stream, with bounded retry on `EAGAIN`/`EWOULDBLOCK`.
//!
//! Split into a send half and a receive half so the Reconciliation Loop can
//! run both as a two-pass sweep over every connected instance — GET out to
//! all of them first, then wait for replies — instead of paying each
//! instance's retry budget serially.

use std::io::{ErrorKind, Read, Write};
use std::os::unix::net::UnixStream;
use std::time::Duration;

use sv_core::{CommandTag, FrameHeader, StatsPayload, HEADER_LEN};

use crate::error::EngineError;

/// Sends a GET frame, retrying on `WouldBlock` up to `retries * interval`.
/// Does not wait for a reply; pair with [`recv_stats`].
pub fn send_get(
    stream: &mut UnixStream,
    path: &str,
    retries: u32,
    interval: Duration,
) -> Result<(), EngineError> {
    stream.set_nonblocking(true).map_err(|source| EngineError::ProtocolIo {
        path: path.to_string(),
        source,
    })?;

    let get_header = FrameHeader::new(CommandTag::Get, 0).encode();
    write_all_retrying(stream, &get_header, path, retries, interval)
}

/// Reads and decodes the OK reply to a previously sent GET, retrying on
/// `WouldBlock` up to `retries * interval`.
pub fn recv_stats(
    stream: &mut UnixStream,
    path: &str,
    retries: u32,
    interval: Duration,
) -> Result<StatsPayload, EngineError> {
    let mut header_buf = [0u8; HEADER_LEN];
    read_exact_retrying(stream, &mut header_buf, path, retries, interval)?;
    let header = FrameHeader::decode_expecting(&header_buf, CommandTag::Ok)?;

    let body = if header.data_size > 0 {
        let mut buf = vec![0u8; header.data_size as usize];
        read_exact_retrying(stream, &mut buf, path, retries, interval)?;
        buf
    } else {
        Vec::new()
    };

    serde_json::from_slice(&body).map_err(|source| EngineError::Decode {
        path: path.to_string(),
        source,
    })
}

fn write_all_retrying(
    stream: &mut UnixStream,
    mut buf: &[u8],
    path: &str,
    retries: u32,
    interval: Duration,
) -> Result<(), EngineError> {
    let mut stalls = 0;
    while !buf.is_empty() {
        match stream.write(buf) {
            Ok(0) => return Err(EngineError::ConnectionClosed { path: path.to_string() }),
            Ok(n) => {
                buf = &buf[n..];
                stalls = 0;
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                stalls += 1;
                if stalls > retries {
                    return Err(EngineError::ProtocolTimeout { path: path.to_string() });
                }
                std::thread::sleep(interval);
            }
            Err(source) => return Err(EngineError::ProtocolIo { path: path.to_string(), source }),
        }
    }
    Ok(())
}

fn read_exact_retrying(
    stream: &mut UnixStream,
    mut buf: &mut [u8],
    path: &str,
    retries: u32,
    interval: Duration,
) -> Result<(), EngineError> {
    let mut stalls = 0;
    while !buf.is_empty() {
        match stream.read(buf) {
            Ok(0) => return Err(EngineError::ConnectionClosed { path: path.to_string() }),
            Ok(n) => {
                buf = &mut buf[n..];
                stalls = 0;
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                stalls += 1;
                if stalls > retries {
                    return Err(EngineError::ProtocolTimeout { path: path.to_string() });
                }
                std::thread::sleep(interval);
            }
            Err(source) => return Err(EngineError::ProtocolIo { path: path.to_string(), source }),
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "stats_client_tests.rs"]
mod tests;
