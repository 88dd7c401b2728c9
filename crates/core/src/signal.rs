// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signal envelopes: the filesystem-backed message channel.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Runner,
    Guardian,
    Terminal,
    Channel,
    System,
}

crate::simple_display! {
    Role {
        Runner => "runner",
        Guardian => "guardian",
        Terminal => "terminal",
        Channel => "channel",
        System => "system",
    }
}

impl Role {
    pub fn from_str_loose(s: &str) -> Option<Self> {
        Some(match s {
            "runner" => Self::Runner,
            "guardian" => Self::Guardian,
            "terminal" => Self::Terminal,
            "channel" => Self::Channel,
            "system" => Self::System,
            _ => return None,
        })
    }
}

/// The closed set of signal types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    NeedsReview,
    NeedsInput,
    Violation,
    OrchestratorStuck,
    OrchestratorCrashed,
    NodeComplete,
    ValidationPassed,
    ValidationFailed,
    InputResponse,
    KillOrchestrator,
    Guidance,
    InboundCommand,
    RunnerStarted,
    RunnerHeartbeat,
    RunnerComplete,
    RunnerStuck,
    RunnerError,
    RunnerUnregistered,
    NodeSpawned,
    NodeImplComplete,
    NodeValidated,
    NodeFailed,
    AwaitingApproval,
    Escalate,
}

/// A signal envelope, written once by its source and consumed once by its target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    pub source: Role,
    pub target: Role,
    pub signal_type: SignalType,
    #[serde(default)]
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Signal {
    pub fn new(source: Role, target: Role, signal_type: SignalType, payload: serde_json::Value, now: DateTime<Utc>) -> Self {
        Self { id: signal_id(source, target, now), source, target, signal_type, payload, created_at: now }
    }

    /// The `{ISO8601}-{src}-{tgt}-{6-random}.json` filename that guarantees
    /// a lexical sort is a chronological sort.
    pub fn filename(&self) -> String {
        format!("{}.json", self.id)
    }
}

/// Generate the monotonically-ordered signal id.
pub fn signal_id(source: Role, target: Role, now: DateTime<Utc>) -> String {
    use rand::Rng;
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let suffix: String = {
        let mut rng = rand::thread_rng();
        (0..6).map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char).collect()
    };
    format!("{}-{}-{}-{}", now.to_rfc3339_opts(SecondsFormat::Nanos, true), source, target, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_from_increasing_timestamps_sort_chronologically() {
        let t0 = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let t1 = t0 + chrono::Duration::milliseconds(5);
        let a = Signal::new(Role::Runner, Role::Guardian, SignalType::RunnerHeartbeat, serde_json::json!({}), t0);
        let b = Signal::new(Role::Runner, Role::Guardian, SignalType::RunnerHeartbeat, serde_json::json!({}), t1);
        let mut names = vec![b.filename(), a.filename()];
        names.sort();
        assert_eq!(names, vec![a.filename(), b.filename()]);
    }

    #[test]
    fn signal_roundtrips_through_json() {
        let now = Utc::now();
        let sig = Signal::new(Role::Guardian, Role::Runner, SignalType::ValidationPassed, serde_json::json!({"node_id": "impl_a"}), now);
        let text = serde_json::to_string(&sig).unwrap();
        let back: Signal = serde_json::from_str(&text).unwrap();
        assert_eq!(sig.id, back.id);
        assert_eq!(back.payload["node_id"], "impl_a");
    }
}
