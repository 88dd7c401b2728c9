// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The chained audit entry type and its canonical-JSON hashing scheme. The
//! hash chain is tamper-evident, not authenticated: its goal is to let
//! `verify_chain` notice edits, not to prove identity.

use crate::node::NodeStatus;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub node_id: String,
    pub from_status: NodeStatus,
    pub to_status: AuditStatus,
    pub agent_id: String,
    pub payload_hash: String,
    pub prev_hash: String,
    pub entry_hash: String,
}

/// `to_status` is usually a [`NodeStatus`], but the optional spot-check
/// entry (C6) carries the advisory `spot_check_flagged` tag instead, so
/// this is a superset rather than a plain `NodeStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Pending,
    Active,
    ImplComplete,
    Validated,
    Failed,
    Blocked,
    SpotCheckFlagged,
}

impl From<NodeStatus> for AuditStatus {
    fn from(s: NodeStatus) -> Self {
        match s {
            NodeStatus::Pending => Self::Pending,
            NodeStatus::Active => Self::Active,
            NodeStatus::ImplComplete => Self::ImplComplete,
            NodeStatus::Validated => Self::Validated,
            NodeStatus::Failed => Self::Failed,
            NodeStatus::Blocked => Self::Blocked,
        }
    }
}

/// Canonical JSON: sorted object keys, no whitespace. Re-serializing the
/// same value always yields the same bytes, which is what makes
/// `entry_hash` reproducible.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(value)?;
    Ok(canonicalize(&value))
}

fn canonicalize(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let parts: Vec<String> =
                keys.iter().map(|k| format!("{}:{}", serde_json::to_string(k).unwrap_or_default(), canonicalize(&map[*k]))).collect();
            format!("{{{}}}", parts.join(","))
        }
        serde_json::Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(canonicalize).collect();
            format!("[{}]", parts.join(","))
        }
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl AuditEntry {
    /// Build the next entry in the chain given the previous entry's hash
    /// (empty string for the first entry).
    pub fn next(
        node_id: impl Into<String>,
        from_status: NodeStatus,
        to_status: AuditStatus,
        agent_id: impl Into<String>,
        payload: &serde_json::Value,
        prev_hash: &str,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<Self, serde_json::Error> {
        let payload_hash = sha256_hex(&canonical_json(payload)?);
        let mut entry = Self {
            timestamp: now,
            node_id: node_id.into(),
            from_status,
            to_status,
            agent_id: agent_id.into(),
            payload_hash,
            prev_hash: prev_hash.to_string(),
            entry_hash: String::new(),
        };
        entry.entry_hash = sha256_hex(&canonical_json(&HashableEntry::from(&entry))?);
        Ok(entry)
    }

    pub fn recompute_hash(&self) -> Result<String, serde_json::Error> {
        Ok(sha256_hex(&canonical_json(&HashableEntry::from(self))?))
    }
}

/// The entry minus its own `entry_hash` field, i.e. what actually gets hashed.
#[derive(Serialize)]
struct HashableEntry<'a> {
    timestamp: chrono::DateTime<chrono::Utc>,
    node_id: &'a str,
    from_status: NodeStatus,
    to_status: AuditStatus,
    agent_id: &'a str,
    payload_hash: &'a str,
    prev_hash: &'a str,
}

impl<'a> From<&'a AuditEntry> for HashableEntry<'a> {
    fn from(e: &'a AuditEntry) -> Self {
        Self {
            timestamp: e.timestamp,
            node_id: &e.node_id,
            from_status: e.from_status,
            to_status: e.to_status,
            agent_id: &e.agent_id,
            payload_hash: &e.payload_hash,
            prev_hash: &e.prev_hash,
        }
    }
}
