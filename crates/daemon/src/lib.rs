// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! pac-daemon: the long-running process that hosts the Guardian reaction
//! loop, the Channel Bridge (C9), and the Notification Dispatcher (C11).
//! The Pipeline Runner itself (`pac-engine::PipelineRunner`) is driven by the
//! `pac` CLI's `runner run` subcommand, not by this binary — `pacd` only
//! watches and reports.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod channel_bridge;
pub mod guardian;
pub mod notification;

pub use channel_bridge::{ChannelBridge, InboundResult, MessageType};
pub use guardian::{AlwaysPassHook, Guardian, GuardianError, ReactionOutcome, ValidationHook, ValidationOutcome, Verdict};
pub use notification::{NotificationDispatcher, NotificationError};
