// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The HCL-flavored DAG source format.
//!
//! ```hcl
//! node "start" {
//!   handler = "terminal-entry"
//! }
//!
//! node "impl_a" {
//!   handler    = "code-generator"
//!   file_path  = "src/impl_a.rs"
//!   acceptance = "unit tests pass"
//! }
//!
//! edge {
//!   from = "start"
//!   to   = "impl_a"
//! }
//! ```
//!
//! Unknown attributes on a `node` block are preserved into `Node::metadata`
//! rather than rejected.

use crate::error::DagLoadError;
use pac_core::{Dag, Handler, Node, NodeId, NodeStatus};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct DagFile {
    #[serde(default)]
    node: HashMap<String, NodeBody>,
    #[serde(default)]
    edge: Vec<EdgeBody>,
}

#[derive(Debug, Deserialize)]
struct NodeBody {
    handler: String,
    #[serde(default)]
    file_path: Option<String>,
    #[serde(default)]
    acceptance: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    retry_count: Option<u32>,
    #[serde(flatten)]
    extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct EdgeBody {
    from: String,
    to: String,
}

/// Parse DAG source text (already read from disk) into a [`Dag`].
pub fn parse(source: &str, origin: &str) -> Result<Dag, DagLoadError> {
    let file: DagFile = hcl::from_str(source).map_err(|source| DagLoadError::Parse { path: origin.to_string(), source })?;

    let mut dag = Dag::new();
    for (id, body) in file.node {
        let handler = Handler::from_str_loose(&body.handler)
            .ok_or_else(|| DagLoadError::UnknownHandler(id.clone(), body.handler.clone()))?;
        let mut node = Node::new(NodeId::new(&id), handler);
        node.file_path = body.file_path;
        node.acceptance = body.acceptance.unwrap_or_default();
        node.retry_count = body.retry_count.unwrap_or(0);
        if let Some(status) = body.status.as_deref() {
            node.status = parse_status(status);
        }
        for (k, v) in body.extra {
            const RESERVED: &[&str] = &["handler", "file_path", "acceptance", "status", "retry_count"];
            if RESERVED.contains(&k.as_str()) {
                continue;
            }
            let rendered = match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            node.metadata.insert(k, rendered);
        }
        dag.insert_node(node);
    }

    for edge in file.edge {
        if !dag.nodes.contains_key(&NodeId::new(&edge.from)) {
            return Err(DagLoadError::UnknownNodeInEdge(edge.from));
        }
        if !dag.nodes.contains_key(&NodeId::new(&edge.to)) {
            return Err(DagLoadError::UnknownNodeInEdge(edge.to));
        }
        dag.add_edge(NodeId::new(&edge.from), NodeId::new(&edge.to));
    }

    Ok(dag)
}

fn parse_status(s: &str) -> NodeStatus {
    match s {
        "active" => NodeStatus::Active,
        "impl_complete" => NodeStatus::ImplComplete,
        "validated" => NodeStatus::Validated,
        "failed" => NodeStatus::Failed,
        "blocked" => NodeStatus::Blocked,
        _ => NodeStatus::Pending,
    }
}

/// Load and parse a DAG description from disk.
pub fn load(path: &Path) -> Result<Dag, DagLoadError> {
    let source = std::fs::read_to_string(path).map_err(|source| DagLoadError::Io { path: path.display().to_string(), source })?;
    parse(&source, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINEAR: &str = r#"
        node "start" {
          handler = "terminal-entry"
        }

        node "impl_a" {
          handler    = "code-generator"
          file_path  = "src/impl_a.rs"
          acceptance = "unit tests pass"
          owner      = "platform-team"
        }

        node "exit" {
          handler = "terminal-exit"
        }

        edge {
          from = "start"
          to   = "impl_a"
        }

        edge {
          from = "impl_a"
          to   = "exit"
        }
    "#;

    #[test]
    fn parses_nodes_and_edges() {
        let dag = parse(LINEAR, "<test>").unwrap();
        assert_eq!(dag.nodes.len(), 3);
        assert_eq!(dag.edges.len(), 2);
        let impl_a = dag.node(&NodeId::new("impl_a")).unwrap();
        assert_eq!(impl_a.file_path.as_deref(), Some("src/impl_a.rs"));
        assert_eq!(impl_a.metadata.get("owner").map(String::as_str), Some("platform-team"));
    }

    #[test]
    fn rejects_unknown_handler() {
        let src = r#"
            node "a" { handler = "not-a-real-handler" }
        "#;
        let err = parse(src, "<test>").unwrap_err();
        assert!(matches!(err, DagLoadError::UnknownHandler(..)));
    }

    #[test]
    fn rejects_edge_to_unknown_node() {
        let src = r#"
            node "a" { handler = "terminal-entry" }
            edge { from = "a" to = "ghost" }
        "#;
        let err = parse(src, "<test>").unwrap_err();
        assert!(matches!(err, DagLoadError::UnknownNodeInEdge(_)));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.dag");
        std::fs::write(&path, LINEAR).unwrap();
        let dag = load(&path).unwrap();
        assert_eq!(dag.nodes.len(), 3);
    }
}
