// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Runner's per-cycle output.

use crate::ids::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Stage {
    Initialize,
    Execute,
    AwaitValidation,
    Finalize,
}

crate::simple_display! {
    Stage {
        Initialize => "INITIALIZE",
        Execute => "EXECUTE",
        AwaitValidation => "AWAIT_VALIDATION",
        Finalize => "FINALIZE",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Normal,
    High,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Normal
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionKind {
    SpawnOrchestrator,
    DispatchValidation,
    TransitionNode { new_status: crate::node::NodeStatus },
    SignalFinalize,
    SignalStuck,
    SendGuidance,
    AskHuman,
}

impl ActionKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::SpawnOrchestrator => "spawn_orchestrator",
            ActionKind::DispatchValidation => "dispatch_validation",
            ActionKind::TransitionNode { .. } => "transition_node",
            ActionKind::SignalFinalize => "signal_finalize",
            ActionKind::SignalStuck => "signal_stuck",
            ActionKind::SendGuidance => "send_guidance",
            ActionKind::AskHuman => "ask_human",
        }
    }

    /// `signal_stuck`/`signal_finalize` must never share a cycle with a
    /// progress-advancing action.
    pub fn is_terminal_only(&self) -> bool {
        matches!(self, ActionKind::SignalFinalize | ActionKind::SignalStuck)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    pub node_id: NodeId,
    #[serde(default)]
    pub priority: Priority,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    /// Present on actions whose hook decision depends on evidence freshness
    /// (C6, evidence-freshness guard): the timestamp the worker claims the
    /// evidence was produced at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_timestamp: Option<chrono::DateTime<chrono::Utc>>,
    /// The agent identity proposing a `validated`/`impl_complete` transition
    /// (C6, implementer-separation guard).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

impl Action {
    pub fn new(kind: ActionKind, node_id: impl Into<NodeId>, reason: impl Into<String>) -> Self {
        Self {
            kind,
            node_id: node_id.into(),
            priority: Priority::Normal,
            reason: reason.into(),
            payload: None,
            evidence_timestamp: None,
            agent_id: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

/// A refused action, recorded with its reason (C6 pre-hook).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedNode {
    pub node_id: NodeId,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub pipeline_id: String,
    pub current_stage: Stage,
    pub summary: String,
    pub actions: Vec<Action>,
    pub blocked_nodes: Vec<BlockedNode>,
    pub completed_nodes: Vec<NodeId>,
    pub pipeline_complete: bool,
    pub retry_counts: HashMap<String, u32>,
}

impl Plan {
    pub fn empty(pipeline_id: impl Into<String>, stage: Stage) -> Self {
        Self {
            pipeline_id: pipeline_id.into(),
            current_stage: stage,
            summary: "nothing actionable; wait and observe".to_string(),
            actions: Vec::new(),
            blocked_nodes: Vec::new(),
            completed_nodes: Vec::new(),
            pipeline_complete: false,
            retry_counts: HashMap::new(),
        }
    }

    /// A plan that advances the pipeline must carry at least one action, or
    /// set `pipeline_complete`.
    pub fn is_well_formed(&self) -> bool {
        self.pipeline_complete || !self.actions.is_empty() || self.summary.contains("wait")
    }
}
