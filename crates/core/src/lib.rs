// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! pac-core: shared entities for the Pipeline Runner + Guardian + Signal Bus.
//!
//! This crate has no I/O and no async — it is the data model
//! plus the cross-cutting abstractions (`Clock`, `PacConfig`) every other
//! crate in the workspace builds on.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod macros;

pub mod audit;
pub mod clock;
pub mod config;
pub mod dag;
pub mod error;
pub mod id;
pub mod identity;
pub mod ids;
pub mod node;
pub mod plan;
pub mod runner_state;
pub mod signal;

pub use audit::{AuditEntry, AuditStatus};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::PacConfig;
pub use dag::Dag;
pub use error::Refusal;
pub use identity::{Identity, IdentityStatus};
pub use ids::{AgentId, NodeId, PipelineId};
pub use node::{Edge, Handler, Node, NodeStatus};
pub use plan::{Action, ActionKind, BlockedNode, Plan, Priority, Stage};
pub use runner_state::RunnerState;
pub use signal::{Role, Signal, SignalType};
