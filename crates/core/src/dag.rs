// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The in-memory DAG: a flat `node_id -> Node` map plus an edge list.
//!
//! Back-references (node to parent, edge endpoints) are stored as `NodeId`
//! keys into a flat map, never as a cyclic object graph.

use crate::ids::NodeId;
use crate::node::{Edge, Node, NodeStatus};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Dag {
    pub nodes: HashMap<NodeId, Node>,
    pub edges: Vec<Edge>,
}

impl Dag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId) {
        self.edges.push(Edge { from, to });
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn predecessors(&self, id: &NodeId) -> impl Iterator<Item = &NodeId> {
        self.edges.iter().filter(move |e| &e.to == id).map(|e| &e.from)
    }

    pub fn successors(&self, id: &NodeId) -> impl Iterator<Item = &NodeId> {
        self.edges.iter().filter(move |e| &e.from == id).map(|e| &e.to)
    }

    /// Every node whose status is `pending` and whose predecessors are all `validated`.
    pub fn ready_nodes(&self) -> Vec<&Node> {
        let mut ready: Vec<&Node> = self
            .nodes
            .values()
            .filter(|n| n.status == NodeStatus::Pending)
            .filter(|n| self.predecessors(&n.id).all(|p| self.is_validated(p)))
            .collect();
        ready.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        ready
    }

    fn is_validated(&self, id: &NodeId) -> bool {
        self.nodes.get(id).map(|n| n.status == NodeStatus::Validated).unwrap_or(false)
    }

    /// Nodes that are `failed` with no predecessor permanently blocked, or
    /// `blocked` with no forward path, or depend (transitively) on a failed
    /// node that has exhausted its retry budget.
    pub fn stuck_nodes(&self, max_retries: u32) -> Vec<(&Node, String)> {
        let mut out = Vec::new();
        for n in self.nodes.values() {
            match n.status {
                NodeStatus::Failed if n.retry_count >= max_retries => {
                    out.push((n, format!("retry budget exhausted ({}/{max_retries})", n.retry_count)));
                }
                NodeStatus::Blocked => {
                    out.push((n, "blocked with no forward path".to_string()));
                }
                NodeStatus::Pending => {
                    if let Some(blocker) = self
                        .predecessors(&n.id)
                        .find(|p| self.nodes.get(*p).map(|pn| pn.status == NodeStatus::Blocked).unwrap_or(false))
                    {
                        out.push((n, format!("dependency `{blocker}` is permanently blocked")));
                    }
                }
                _ => {}
            }
        }
        out.sort_by(|a, b| a.0.id.as_str().cmp(b.0.id.as_str()));
        out
    }

    /// Overlay persisted `RunnerState.node_statuses`/`retry_counts` onto a
    /// freshly parsed DAG, since the on-disk DAG source is immutable
    /// structure, not live status.
    pub fn apply_overlay(&mut self, statuses: &HashMap<String, NodeStatus>, retry_counts: &HashMap<String, u32>) {
        for (id, node) in self.nodes.iter_mut() {
            if let Some(status) = statuses.get(id.as_str()) {
                node.status = *status;
            }
            if let Some(retries) = retry_counts.get(id.as_str()) {
                node.retry_count = *retries;
            }
        }
    }

    /// The pipeline is complete once every terminal-exit node (or, absent
    /// one, every leaf node) is `validated`.
    pub fn is_complete(&self) -> bool {
        let exits: Vec<&Node> = self
            .nodes
            .values()
            .filter(|n| n.handler == crate::node::Handler::TerminalExit)
            .collect();
        if !exits.is_empty() {
            return exits.iter().all(|n| n.status == NodeStatus::Validated);
        }
        let leaves = self.nodes.values().filter(|n| self.successors(&n.id).next().is_none());
        leaves.into_iter().all(|n| n.status == NodeStatus::Validated)
    }
}
