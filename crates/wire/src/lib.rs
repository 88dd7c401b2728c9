// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! pac-wire: flat, serializable view types shared between `pac-cli` and the
//! rest of the workspace, so neither the CLI nor `pac-daemon` depends on the
//! internal shape of `pac-core`'s domain types to print or transmit them.
//!
//! Each view type is built from a core type via a `From` impl or a narrow
//! constructor, never the other way around — these are read-only
//! projections, not part of the domain model.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod health;
pub mod view;

pub use health::{Health, PipelineHealthView};
pub use view::{AuditEntryView, ChainVerdictView, SignalView};
