// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! pac-dag: parse a textual DAG description into a [`pac_core::Dag`].
//!
//! The ready-set/stuck-set/completeness queries themselves live on
//! `pac_core::Dag` since they operate purely on the in-memory model; this
//! crate owns only the textual-format concern (the "Loader" half of C4).

pub mod error;
pub mod format;

pub use error::DagLoadError;
pub use format::load;
