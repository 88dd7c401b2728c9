// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors from the Session Host Adapter.
#[derive(Debug, Error)]
pub enum SessionHostError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("session `{0}` already exists and is alive")]
    AlreadyAlive(String),
    #[error("session name `{0}` uses a reserved prefix")]
    ReservedName(String),
    #[error("respawn cap reached for `{name}`: {attempted}/{max}")]
    RespawnCapReached { name: String, attempted: u32, max: u32 },
    #[error("session `{0}` not found")]
    NotFound(String),
}

/// Errors from a Channel Bridge adapter send.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("send to channel `{channel}` failed: {reason}")]
    SendFailed { channel: String, reason: String },
}
