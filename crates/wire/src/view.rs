// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flat view projections of `pac-core` entities, for the CLI's `--json`
//! output and any future wire transport, built with plain `From<&Core> for
//! View` conversions.

use chrono::{DateTime, Utc};
use pac_core::{AuditEntry, AuditStatus, NodeStatus, Role, Signal, SignalType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntryView {
    pub timestamp: DateTime<Utc>,
    pub node_id: String,
    pub from_status: NodeStatus,
    pub to_status: AuditStatus,
    pub agent_id: String,
    pub prev_hash: String,
    pub entry_hash: String,
}

impl From<&AuditEntry> for AuditEntryView {
    fn from(e: &AuditEntry) -> Self {
        Self {
            timestamp: e.timestamp,
            node_id: e.node_id.clone(),
            from_status: e.from_status,
            to_status: e.to_status,
            agent_id: e.agent_id.clone(),
            prev_hash: e.prev_hash.clone(),
            entry_hash: e.entry_hash.clone(),
        }
    }
}

impl From<AuditEntry> for AuditEntryView {
    fn from(e: AuditEntry) -> Self {
        (&e).into()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalView {
    pub id: String,
    pub source: Role,
    pub target: Role,
    pub signal_type: SignalType,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<&Signal> for SignalView {
    fn from(s: &Signal) -> Self {
        Self { id: s.id.clone(), source: s.source, target: s.target, signal_type: s.signal_type, payload: s.payload.clone(), created_at: s.created_at }
    }
}

impl From<Signal> for SignalView {
    fn from(s: Signal) -> Self {
        (&s).into()
    }
}

/// JSON-friendly projection of `pac_store::ChainVerdict`, which lives in a
/// crate `pac-wire` does not depend on; callers build this directly from the
/// match arms rather than through a `From` impl.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainVerdictView {
    pub ok: bool,
    pub message: String,
}

impl ChainVerdictView {
    pub fn intact() -> Self {
        Self { ok: true, message: "chain intact".to_string() }
    }

    pub fn broken(line: usize, reason: impl Into<String>) -> Self {
        Self { ok: false, message: format!("entry {line}: {}", reason.into()) }
    }
}
