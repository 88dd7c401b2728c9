// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identity Registry: one JSON file per live or
//! recently-live agent, keyed by `{role}-{name}`.

use crate::atomic::{read_json, write_json_atomic};
use crate::error::{IdentityError, StoreIoError};
use pac_core::identity::IdentityStatus;
use pac_core::signal::Role;
use pac_core::Identity;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct IdentityRegistry {
    dir: PathBuf,
}

impl IdentityRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, role: Role, name: &str) -> PathBuf {
        self.dir.join(format!("{role}-{name}.json"))
    }

    pub fn create(&self, identity: &Identity) -> Result<(), IdentityError> {
        let path = self.path_for(identity.role, &identity.name);
        write_json_atomic(&path, identity).map_err(IdentityError::from)
    }

    pub fn read(&self, role: Role, name: &str) -> Result<Identity, IdentityError> {
        let path = self.path_for(role, name);
        match read_json(&path) {
            Ok(identity) => Ok(identity),
            Err(StoreIoError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(IdentityError::NotFound(format!("{role}-{name}")))
            }
            Err(e) => Err(IdentityError::from(e)),
        }
    }

    pub fn heartbeat(&self, role: Role, name: &str, now: chrono::DateTime<chrono::Utc>) -> Result<Identity, IdentityError> {
        let mut identity = self.read(role, name)?;
        identity.last_heartbeat = now;
        self.create(&identity)?;
        Ok(identity)
    }

    pub fn mark_crashed(&self, role: Role, name: &str, now: chrono::DateTime<chrono::Utc>) -> Result<Identity, IdentityError> {
        let mut identity = self.read(role, name)?;
        identity.status = IdentityStatus::Crashed;
        identity.crashed_at = Some(now);
        self.create(&identity)?;
        Ok(identity)
    }

    pub fn mark_terminated(&self, role: Role, name: &str, now: chrono::DateTime<chrono::Utc>) -> Result<Identity, IdentityError> {
        let mut identity = self.read(role, name)?;
        identity.status = IdentityStatus::Terminated;
        identity.terminated_at = Some(now);
        self.create(&identity)?;
        Ok(identity)
    }

    pub fn list_all(&self) -> Result<Vec<Identity>, IdentityError> {
        let mut out = Vec::new();
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
            Err(e) => return Err(IdentityError::from(StoreIoError::from(e))),
        };
        for entry in entries {
            let entry = entry.map_err(|e| IdentityError::from(StoreIoError::from(e)))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let identity: Identity = read_json(&path).map_err(IdentityError::from)?;
            out.push(identity);
        }
        out.sort_by(|a, b| a.file_stem().cmp(&b.file_stem()));
        Ok(out)
    }

    /// Active identities whose last heartbeat is older than `timeout`.
    pub fn find_stale(&self, now: chrono::DateTime<chrono::Utc>, timeout: std::time::Duration) -> Result<Vec<Identity>, IdentityError> {
        Ok(self.list_all()?.into_iter().filter(|id| id.is_stale(now, timeout)).collect())
    }
}
