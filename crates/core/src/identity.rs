// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The registry record for one live agent.

use crate::ids::AgentId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityStatus {
    Active,
    Crashed,
    Terminated,
}

crate::simple_display! {
    IdentityStatus {
        Active => "active",
        Crashed => "crashed",
        Terminated => "terminated",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub role: crate::signal::Role,
    pub name: String,
    pub session_id: String,
    pub worktree: String,
    pub agent_id: AgentId,
    pub status: IdentityStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_heartbeat: chrono::DateTime<chrono::Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crashed_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminated_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predecessor_id: Option<AgentId>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Identity {
    pub fn new(role: crate::signal::Role, name: impl Into<String>, session_id: impl Into<String>, worktree: impl Into<String>, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            role,
            name: name.into(),
            session_id: session_id.into(),
            worktree: worktree.into(),
            agent_id: AgentId::new(),
            status: IdentityStatus::Active,
            created_at: now,
            last_heartbeat: now,
            crashed_at: None,
            terminated_at: None,
            predecessor_id: None,
            metadata: HashMap::new(),
        }
    }

    /// The key `{role}-{name}.json` under which this identity is stored.
    pub fn file_stem(&self) -> String {
        format!("{}-{}", self.role, self.name)
    }

    pub fn is_stale(&self, now: chrono::DateTime<chrono::Utc>, timeout: std::time::Duration) -> bool {
        self.status == IdentityStatus::Active
            && (now - self.last_heartbeat) > chrono::Duration::from_std(timeout).unwrap_or(chrono::Duration::zero())
    }
}
