// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DagLoadError {
    #[error("I/O error reading {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },
    #[error("HCL parse error in {path}: {source}")]
    Parse { path: String, #[source] source: hcl::Error },
    #[error("node `{0}` has unknown handler kind `{1}`")]
    UnknownHandler(String, String),
    #[error("edge references unknown node `{0}`")]
    UnknownNodeInEdge(String),
}
