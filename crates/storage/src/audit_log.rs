// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chained Audit Writer: an append-only JSONL log where
//! each line's `prev_hash` must equal the previous line's `entry_hash`.

use crate::atomic::append_line_fsync;
use crate::error::AuditError;
use pac_core::audit::canonical_json;
use pac_core::{AuditEntry, AuditStatus, NodeStatus};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

/// Where `verify_chain` found the chain to break, if anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainVerdict {
    Intact,
    Broken { line: usize, reason: String },
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_entries(&self) -> Result<Vec<AuditEntry>, AuditError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AuditError::Io(e.into())),
        };
        let mut out = Vec::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let entry: AuditEntry = serde_json::from_str(line).map_err(|e| AuditError::Io(e.into()))?;
            out.push(entry);
        }
        Ok(out)
    }

    fn last_hash(&self) -> Result<String, AuditError> {
        Ok(self.read_entries()?.last().map(|e| e.entry_hash.clone()).unwrap_or_default())
    }

    /// Append the next entry, linking it to the current tail hash.
    pub fn append(
        &self,
        node_id: impl Into<String>,
        from_status: NodeStatus,
        to_status: AuditStatus,
        agent_id: impl Into<String>,
        payload: &serde_json::Value,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<AuditEntry, AuditError> {
        let prev_hash = self.last_hash()?;
        let entry = AuditEntry::next(node_id, from_status, to_status, agent_id, payload, &prev_hash, now)
            .map_err(|e| AuditError::Io(e.into()))?;
        let line = canonical_json(&entry).map_err(|e| AuditError::Io(e.into()))?;
        append_line_fsync(&self.path, &line)?;
        Ok(entry)
    }

    /// Walk the whole file, confirming every entry's `prev_hash` matches the
    /// previous entry's recomputed `entry_hash`, and that no entry's stored
    /// `entry_hash` has been altered out from under it.
    pub fn verify_chain(&self) -> Result<ChainVerdict, AuditError> {
        let entries = self.read_entries()?;
        let mut expected_prev = String::new();
        for (i, entry) in entries.iter().enumerate() {
            if entry.prev_hash != expected_prev {
                return Ok(ChainVerdict::Broken { line: i, reason: "prev_hash does not match preceding entry".to_string() });
            }
            let recomputed = entry.recompute_hash().map_err(|e| AuditError::Io(e.into()))?;
            if recomputed != entry.entry_hash {
                return Ok(ChainVerdict::Broken { line: i, reason: "entry_hash does not match entry contents".to_string() });
            }
            expected_prev = entry.entry_hash.clone();
        }
        Ok(ChainVerdict::Intact)
    }

    pub fn count(&self) -> Result<usize, AuditError> {
        Ok(self.read_entries()?.len())
    }

    /// The last `n` entries, oldest-first.
    pub fn tail(&self, n: usize) -> Result<Vec<AuditEntry>, AuditError> {
        let mut entries = self.read_entries()?;
        if entries.len() > n {
            entries = entries.split_off(entries.len() - n);
        }
        Ok(entries)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_log_verifies_as_intact() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("audit.jsonl"));
        assert_eq!(log.verify_chain().unwrap(), ChainVerdict::Intact);
        assert_eq!(log.count().unwrap(), 0);
    }

    #[test]
    fn appended_entries_chain_and_verify() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("audit.jsonl"));
        let now = chrono::Utc::now();
        log.append("impl_a", NodeStatus::Pending, AuditStatus::Active, "ag-1", &serde_json::json!({}), now).unwrap();
        log.append("impl_a", NodeStatus::Active, AuditStatus::ImplComplete, "ag-1", &serde_json::json!({}), now).unwrap();
        assert_eq!(log.count().unwrap(), 2);
        assert_eq!(log.verify_chain().unwrap(), ChainVerdict::Intact);
    }

    #[test]
    fn tampered_line_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let log = AuditLog::new(&path);
        let now = chrono::Utc::now();
        log.append("impl_a", NodeStatus::Pending, AuditStatus::Active, "ag-1", &serde_json::json!({}), now).unwrap();
        log.append("impl_a", NodeStatus::Active, AuditStatus::ImplComplete, "ag-1", &serde_json::json!({}), now).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines: Vec<String> = text.lines().map(String::from).collect();
        let mut first: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        first["agent_id"] = serde_json::json!("ag-attacker");
        lines[0] = first.to_string();
        std::fs::write(&path, lines.join("\n") + "\n").unwrap();

        match log.verify_chain().unwrap() {
            ChainVerdict::Broken { line, .. } => assert_eq!(line, 0),
            ChainVerdict::Intact => panic!("tampering should have been detected"),
        }
    }

    #[test]
    fn tail_returns_last_n_oldest_first() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("audit.jsonl"));
        let now = chrono::Utc::now();
        for i in 0..5 {
            log.append(format!("node-{i}"), NodeStatus::Pending, AuditStatus::Active, "ag-1", &serde_json::json!({}), now).unwrap();
        }
        let last_two = log.tail(2).unwrap();
        assert_eq!(last_two.len(), 2);
        assert_eq!(last_two[0].node_id, "node-3");
        assert_eq!(last_two[1].node_id, "node-4");
    }

    proptest::proptest! {
        /// Any run of legitimate appends verifies intact, no matter how many
        /// entries or what their node ids are (spec.md §8 "audit chain intact").
        #[test]
        fn any_legitimate_append_sequence_verifies_intact(node_ids in proptest::collection::vec("[a-z_]{1,12}", 1..20)) {
            let dir = tempfile::tempdir().unwrap();
            let log = AuditLog::new(dir.path().join("audit.jsonl"));
            let now = chrono::Utc::now();
            for node_id in &node_ids {
                log.append(node_id.clone(), NodeStatus::Pending, AuditStatus::Active, "ag-1", &serde_json::json!({}), now).unwrap();
            }
            proptest::prop_assert_eq!(log.verify_chain().unwrap(), ChainVerdict::Intact);
            proptest::prop_assert_eq!(log.count().unwrap(), node_ids.len());
        }

        /// Flipping a single field on any entry but the last breaks the chain
        /// at that entry's line, regardless of how many entries follow it.
        #[test]
        fn tampering_any_non_last_entry_is_caught(
            node_ids in proptest::collection::vec("[a-z_]{1,12}", 2..20),
            tamper_index in 0usize..18,
        ) {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("audit.jsonl");
            let log = AuditLog::new(&path);
            let now = chrono::Utc::now();
            for node_id in &node_ids {
                log.append(node_id.clone(), NodeStatus::Pending, AuditStatus::Active, "ag-1", &serde_json::json!({}), now).unwrap();
            }
            let tamper_index = tamper_index % (node_ids.len() - 1);

            let text = std::fs::read_to_string(&path).unwrap();
            let mut lines: Vec<String> = text.lines().map(String::from).collect();
            let mut entry: serde_json::Value = serde_json::from_str(&lines[tamper_index]).unwrap();
            entry["agent_id"] = serde_json::json!("ag-attacker");
            lines[tamper_index] = entry.to_string();
            std::fs::write(&path, lines.join("\n") + "\n").unwrap();

            match log.verify_chain().unwrap() {
                ChainVerdict::Broken { line, .. } => proptest::prop_assert_eq!(line, tamper_index),
                ChainVerdict::Intact => proptest::prop_assert!(false, "tampering should have been detected"),
            }
        }
    }
}
