// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// All write failures from this crate are fatal to the caller:
/// the store never hides a partial write, it only ever shows a complete one
/// or none at all.
#[derive(Debug, Error)]
pub enum StoreIoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SignalStoreError {
    #[error(transparent)]
    Io(#[from] StoreIoError),
    #[error("malformed signal at {path}: {source}")]
    MalformedSignal { path: String, #[source] source: serde_json::Error },
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error(transparent)]
    Io(#[from] StoreIoError),
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error(transparent)]
    Io(#[from] StoreIoError),
    #[error("identity {0} not found")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum RunnerStateError {
    #[error(transparent)]
    Io(#[from] StoreIoError),
    #[error("runner state for pipeline {0} not found")]
    NotFound(String),
}
