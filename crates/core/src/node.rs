// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A vertex in the pipeline DAG.

use crate::ids::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What kind of work a node performs, dictating how the Runner executes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Handler {
    CodeGenerator,
    AutomatedValidator,
    HumanWait,
    DecisionBranch,
    TerminalEntry,
    TerminalExit,
}

crate::simple_display! {
    Handler {
        CodeGenerator => "code-generator",
        AutomatedValidator => "automated-validator",
        HumanWait => "human-wait",
        DecisionBranch => "decision-branch",
        TerminalEntry => "terminal-entry",
        TerminalExit => "terminal-exit",
    }
}

impl Handler {
    pub fn from_str_loose(s: &str) -> Option<Self> {
        Some(match s {
            "code-generator" => Self::CodeGenerator,
            "automated-validator" => Self::AutomatedValidator,
            "human-wait" => Self::HumanWait,
            "decision-branch" => Self::DecisionBranch,
            "terminal-entry" => Self::TerminalEntry,
            "terminal-exit" => Self::TerminalExit,
            _ => return None,
        })
    }
}

/// A node's lifecycle status, driven by the runner's per-node state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Pending,
    Active,
    ImplComplete,
    Validated,
    Failed,
    Blocked,
}

crate::simple_display! {
    NodeStatus {
        Pending => "pending",
        Active => "active",
        ImplComplete => "impl_complete",
        Validated => "validated",
        Failed => "failed",
        Blocked => "blocked",
    }
}

impl NodeStatus {
    /// True for {validated, failed-with-no-retries-left, blocked}.
    pub fn is_terminal_for(&self, retry_count: u32, max_retries: u32) -> bool {
        match self {
            NodeStatus::Validated | NodeStatus::Blocked => true,
            NodeStatus::Failed => retry_count >= max_retries,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub handler: Handler,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default)]
    pub acceptance: String,
    #[serde(default = "default_status")]
    pub status: NodeStatus,
    #[serde(default)]
    pub retry_count: u32,
    /// Unknown DAG-source attributes, preserved verbatim.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

fn default_status() -> NodeStatus {
    NodeStatus::Pending
}

impl Node {
    pub fn new(id: impl Into<NodeId>, handler: Handler) -> Self {
        Self {
            id: id.into(),
            handler,
            file_path: None,
            acceptance: String::new(),
            status: NodeStatus::Pending,
            retry_count: 0,
            metadata: HashMap::new(),
        }
    }
}

/// A dependency edge: `to` is ready only once every predecessor is `validated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_node_is_terminal_only_after_retry_budget() {
        assert!(!NodeStatus::Failed.is_terminal_for(2, 3));
        assert!(NodeStatus::Failed.is_terminal_for(3, 3));
        assert!(NodeStatus::Failed.is_terminal_for(4, 3));
    }

    #[test]
    fn validated_and_blocked_always_terminal() {
        assert!(NodeStatus::Validated.is_terminal_for(0, 3));
        assert!(NodeStatus::Blocked.is_terminal_for(0, 3));
    }

    #[yare::parameterized(
        code_generator = { "code-generator", Some(Handler::CodeGenerator) },
        automated_validator = { "automated-validator", Some(Handler::AutomatedValidator) },
        human_wait = { "human-wait", Some(Handler::HumanWait) },
        decision_branch = { "decision-branch", Some(Handler::DecisionBranch) },
        terminal_entry = { "terminal-entry", Some(Handler::TerminalEntry) },
        terminal_exit = { "terminal-exit", Some(Handler::TerminalExit) },
        unknown = { "frobnicator", None },
        empty = { "", None },
    )]
    fn from_str_loose_classifies_the_closed_table(text: &str, expected: Option<Handler>) {
        assert_eq!(Handler::from_str_loose(text), expected);
    }
}
