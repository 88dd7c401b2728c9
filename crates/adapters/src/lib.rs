// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! pac-adapters: the two capability seams the core never reaches past
//! directly — spawning/supervising worker sessions, and fanning
//! notifications out to chat channels.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod channel_adapter;
pub mod error;
pub mod session_host;

pub use channel_adapter::{Card, ChannelAdapter, DesktopChannelAdapter, InboundMessage, LoggingChannelAdapter, WebhookChannelAdapter};
pub use error::{ChannelError, SessionHostError};
pub use session_host::{RespawnOutcome, ReservedPrefixGuard, SessionHost, TmuxSessionHost};

#[cfg(any(test, feature = "test-support"))]
pub use channel_adapter::{FakeChannelAdapter, SentMessage};
#[cfg(any(test, feature = "test-support"))]
pub use session_host::FakeSessionHost;
