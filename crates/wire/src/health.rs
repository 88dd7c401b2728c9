// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Guardian health reporting. The label table is
//! reproduced verbatim; the view flattens a `RunnerState` into the fields a
//! `guardian status`/`guardian list` caller actually wants.

use chrono::{DateTime, Utc};
use pac_core::{PacConfig, RunnerState};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    Complete,
    Paused,
    Stale,
    Stuck,
    Warning,
    Healthy,
}

impl std::fmt::Display for Health {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Health::Complete => "complete",
            Health::Paused => "paused",
            Health::Stale => "stale",
            Health::Stuck => "stuck",
            Health::Warning => "warning",
            Health::Healthy => "healthy",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineHealthView {
    pub pipeline_id: String,
    pub health: Health,
    pub updated_at: DateTime<Utc>,
    pub age_seconds: i64,
    pub paused: bool,
    pub pipeline_complete: bool,
    pub blocked_count: usize,
    pub actions_count: usize,
    pub retry_counts: HashMap<String, u32>,
}

impl PipelineHealthView {
    /// Derive a [`Health`] label for `state` as of `now`, per the condition
    /// table below, evaluated top to bottom (first match wins).
    pub fn compute(state: &RunnerState, now: DateTime<Utc>, config: &PacConfig) -> Self {
        let age = now.signed_duration_since(state.updated_at);
        let age_seconds = age.num_seconds().max(0);
        let actions_count = state.last_plan.as_ref().map(|p| p.actions.len()).unwrap_or(0);
        let blocked_count = state.last_plan.as_ref().map(|p| p.blocked_nodes.len()).unwrap_or(0);
        let stale_threshold = chrono::Duration::from_std(config.stale_threshold()).unwrap_or_else(|_| chrono::Duration::zero());

        let health = if state.pipeline_complete() {
            Health::Complete
        } else if state.paused {
            Health::Paused
        } else if age > stale_threshold {
            Health::Stale
        } else if blocked_count > 0 && actions_count == 0 {
            Health::Stuck
        } else if state.retry_counts.values().any(|&n| n >= 2) {
            Health::Warning
        } else {
            Health::Healthy
        };

        Self {
            pipeline_id: state.pipeline_id.clone(),
            health,
            updated_at: state.updated_at,
            age_seconds,
            paused: state.paused,
            pipeline_complete: state.pipeline_complete(),
            blocked_count,
            actions_count,
            retry_counts: state.retry_counts.clone(),
        }
    }
}
