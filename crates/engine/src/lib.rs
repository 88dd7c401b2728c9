// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! pac-engine: the Pipeline Runner (C5), its guard rails (C6), and the
//! optional Completion Judge (C10). This crate is where DAG state,
//! persisted `RunnerState`, the signal bus, and the session host adapter
//! all come together into the per-cycle planning loop.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod hooks;
pub mod judge;
pub mod runner;
pub mod signals;

pub use hooks::GuardRails;
pub use judge::{CompletionJudge, DelegatingJudge, JudgeError, JudgeInput, JudgeVerdict, NoopJudge, Summariser};
pub use runner::{PipelineRunner, RunnerError};
