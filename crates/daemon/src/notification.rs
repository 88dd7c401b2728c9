// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification Dispatcher: decides whether an outbound
//! signal is worth waking a human for, collapsing repeats of the same event
//! within a window and deferring non-urgent ones outside working hours.
//!
//! Follows the same "fire and log the outcome" shape as a desktop
//! notification adapter, and uses `pac_store::atomic` for the persisted
//! log's crash-safety.

use crate::channel_bridge::ChannelBridge;
use chrono::{DateTime, NaiveTime, Timelike, Utc};
use pac_core::{PacConfig, SignalType};
use pac_store::atomic::append_line_fsync;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("notification log io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("notification log store error: {0}")]
    Store(#[from] pac_store::StoreIoError),
    #[error("notification log serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One persisted line in the notification log: enough to recompute the
/// 300-second dedup window without re-reading every signal that ever fired.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct LogEntry {
    dedup_key: String,
    sent_at: DateTime<Utc>,
}

/// Urgent event types bypass quiet hours: anything
/// that represents the pipeline stopping dead or a guard rail firing.
fn is_urgent(signal_type: SignalType) -> bool {
    matches!(
        signal_type,
        SignalType::Violation
            | SignalType::OrchestratorCrashed
            | SignalType::OrchestratorStuck
            | SignalType::RunnerStuck
            | SignalType::RunnerError
            | SignalType::Escalate
    )
}

/// The subset of an event's payload fields that make two occurrences "the
/// same event" for dedup purposes.
fn core_fields(signal_type: SignalType, payload: &serde_json::Value) -> Vec<(&'static str, String)> {
    let get = |key: &str| payload.get(key).map(|v| v.to_string()).unwrap_or_default();
    match signal_type {
        SignalType::NodeFailed | SignalType::ValidationFailed | SignalType::NeedsReview => {
            vec![("node_id", get("node_id"))]
        }
        SignalType::OrchestratorStuck | SignalType::OrchestratorCrashed | SignalType::NeedsInput => {
            vec![("node_id", get("node_id")), ("session_id", get("session_id"))]
        }
        SignalType::RunnerStuck | SignalType::RunnerError | SignalType::RunnerComplete => {
            vec![("pipeline_id", get("pipeline_id"))]
        }
        SignalType::Violation => vec![("node_id", get("node_id")), ("reason", get("reason"))],
        SignalType::Escalate => vec![("pipeline_id", get("pipeline_id")), ("issue", get("issue"))],
        _ => vec![("payload", payload.to_string())],
    }
}

/// `dedup_key = sha256(event_type || core_fields)`.
fn dedup_key(signal_type: SignalType, payload: &serde_json::Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{signal_type:?}").as_bytes());
    for (name, value) in core_fields(signal_type, payload) {
        hasher.update(b"|");
        hasher.update(name.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Whether `now` falls inside the configured quiet window, handling the
/// overnight case where `start > end` (e.g. 22:00–07:00) by treating the
/// window as everything outside `[end, start)` instead of inside it.
/// `None` on either bound disables quiet-hours gating entirely.
fn in_quiet_hours(now: DateTime<Utc>, start: Option<(u32, u32)>, end: Option<(u32, u32)>) -> bool {
    let (Some((sh, sm)), Some((eh, em))) = (start, end) else {
        return false;
    };
    let t = now.time().with_nanosecond(0).unwrap_or(now.time());
    let start = NaiveTime::from_hms_opt(sh, sm, 0).unwrap_or(t);
    let end = NaiveTime::from_hms_opt(eh, em, 0).unwrap_or(t);
    if start <= end {
        t >= start && t <= end
    } else {
        t >= start || t <= end
    }
}

pub struct NotificationDispatcher {
    log_path: PathBuf,
    config: PacConfig,
}

impl NotificationDispatcher {
    pub fn new(log_path: impl Into<PathBuf>, config: PacConfig) -> Self {
        Self { log_path: log_path.into(), config }
    }

    fn read_log(&self) -> Result<Vec<LogEntry>, NotificationError> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }
        let text = std::fs::read_to_string(&self.log_path)?;
        Ok(text.lines().filter_map(|line| serde_json::from_str(line).ok()).collect())
    }

    /// Has an entry with this `dedup_key` been logged within the dedup
    /// window ending at `now`?
    fn recently_sent(&self, key: &str, now: DateTime<Utc>) -> Result<bool, NotificationError> {
        let window = self.config.dedup_window();
        Ok(self.read_log()?.iter().any(|e| e.dedup_key == key && now.signed_duration_since(e.sent_at).to_std().map(|d| d < window).unwrap_or(false)))
    }

    fn record(&self, key: &str, now: DateTime<Utc>) -> Result<(), NotificationError> {
        let entry = LogEntry { dedup_key: key.to_string(), sent_at: now };
        if let Some(parent) = self.log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let line = serde_json::to_string(&entry)?;
        append_line_fsync(&self.log_path, &line)?;
        Ok(())
    }

    /// Decide whether to broadcast `signal_type`/`payload`, honoring dedup
    /// and quiet hours, and if so hand it to `bridge`.
    pub async fn dispatch(
        &self,
        bridge: &ChannelBridge,
        signal_type: SignalType,
        payload: serde_json::Value,
        pipeline_status: Option<serde_json::Value>,
        now: DateTime<Utc>,
    ) -> Result<bool, NotificationError> {
        let key = dedup_key(signal_type, &payload);
        if self.recently_sent(&key, now)? {
            tracing::debug!(dedup_key = %key, ?signal_type, "suppressing duplicate notification");
            return Ok(false);
        }

        if !is_urgent(signal_type) && in_quiet_hours(now, self.config.quiet_start, self.config.quiet_end) {
            tracing::debug!(?signal_type, "deferring non-urgent notification during quiet hours");
            return Ok(false);
        }

        bridge.broadcast(signal_type, payload, pipeline_status).await;
        self.record(&key, now)?;
        Ok(true)
    }
}
