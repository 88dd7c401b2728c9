// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `RunnerState`: the per-pipeline persisted record.

use crate::node::NodeStatus;
use crate::plan::Plan;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerState {
    pub pipeline_id: String,
    pub pipeline_path: String,
    pub session_id: String,
    #[serde(default)]
    pub paused: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_plan: Option<Plan>,
    #[serde(default)]
    pub retry_counts: HashMap<String, u32>,
    /// node_id -> agent id that implemented it (for implementer-separation).
    #[serde(default)]
    pub implementer_map: HashMap<String, String>,
    /// node_id -> current status, overlaid onto the freshly parsed DAG at the
    /// start of every cycle. The on-disk DAG source (`pipeline_path`) is
    /// treated as immutable input describing structure, not live status, so
    /// this is where mutations from `transition_node` actually persist.
    #[serde(default)]
    pub node_statuses: HashMap<String, NodeStatus>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_checkpoint_path: Option<String>,
}

impl RunnerState {
    pub fn new(pipeline_id: impl Into<String>, pipeline_path: impl Into<String>, session_id: impl Into<String>, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            pipeline_id: pipeline_id.into(),
            pipeline_path: pipeline_path.into(),
            session_id: session_id.into(),
            paused: false,
            last_plan: None,
            retry_counts: HashMap::new(),
            implementer_map: HashMap::new(),
            node_statuses: HashMap::new(),
            updated_at: now,
            completed_checkpoint_path: None,
        }
    }

    pub fn pipeline_complete(&self) -> bool {
        self.last_plan.as_ref().map(|p| p.pipeline_complete).unwrap_or(false)
    }
}
