// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner Hooks / Guard Rails.
//!
//! Every proposed [`Action`] passes through [`GuardRails::pre_hook`] before
//! it may run; a refusal never unwinds, it is recorded as a [`Refusal`] and
//! the Runner drops the action. [`GuardRails::post_hook`] runs only for
//! actions that were accepted and executed, and is where the audit chain and
//! retry bookkeeping actually get mutated.

use pac_core::plan::{Action, ActionKind};
use pac_core::{AuditStatus, Dag, PacConfig, Refusal, RunnerState};
use pac_store::AuditLog;

#[derive(Debug, Clone, Copy)]
pub struct GuardRails<'a> {
    config: &'a PacConfig,
}

impl<'a> GuardRails<'a> {
    pub fn new(config: &'a PacConfig) -> Self {
        Self { config }
    }

    /// Gate a proposed action. `Ok(())` means the Runner may execute it;
    /// `Err(refusal)` means it must be dropped and recorded in
    /// `Plan::blocked_nodes` instead.
    /// There is no guard 1 (forbidden-tool) here: that check guarded against
    /// an LLM agent directly invoking `Edit`/`Write`/`MultiEdit` tool calls,
    /// which has no counterpart on this side of the boundary. `ActionKind` is
    /// a closed sum type the Runner itself constructs, and none of its
    /// variants can express a direct file mutation, so the check would be a
    /// predicate that can never refuse anything.
    pub fn pre_hook(&self, action: &Action, dag: &Dag, state: &RunnerState, now: chrono::DateTime<chrono::Utc>) -> Result<(), Refusal> {
        self.retry_limit_guard(action, state)?;
        self.evidence_freshness_guard(action, now)?;
        self.implementer_separation_guard(action, state)?;
        let _ = dag;
        Ok(())
    }

    /// Guard: refuse reactivating a node whose retry budget is spent.
    fn retry_limit_guard(&self, action: &Action, state: &RunnerState) -> Result<(), Refusal> {
        if let ActionKind::TransitionNode { new_status: pac_core::NodeStatus::Active } = action.kind {
            let retries = state.retry_counts.get(action.node_id.as_str()).copied().unwrap_or(0);
            if retries >= self.config.max_retries {
                return Err(Refusal::new(format!(
                    "node `{}` has exhausted its retry budget ({}/{})",
                    action.node_id, retries, self.config.max_retries
                )));
            }
        }
        Ok(())
    }

    /// Guard: evidence must be neither stale nor from the future.
    fn evidence_freshness_guard(&self, action: &Action, now: chrono::DateTime<chrono::Utc>) -> Result<(), Refusal> {
        let validating = matches!(
            action.kind,
            ActionKind::TransitionNode { new_status: pac_core::NodeStatus::Validated }
                | ActionKind::TransitionNode { new_status: pac_core::NodeStatus::ImplComplete }
        );
        if !validating {
            return Ok(());
        }
        let Some(evidence_at) = action.evidence_timestamp else {
            return Ok(());
        };
        let age = now.signed_duration_since(evidence_at);
        let max_age = chrono::Duration::from_std(self.config.evidence_max_age()).unwrap_or(chrono::Duration::zero());
        if age > max_age {
            return Err(Refusal::new(format!(
                "evidence for `{}` is {}s old, older than the {}s freshness window",
                action.node_id,
                age.num_seconds(),
                self.config.evidence_max_age_seconds
            )));
        }
        if age < -max_age {
            return Err(Refusal::new(format!("evidence for `{}` is timestamped in the future", action.node_id)));
        }
        Ok(())
    }

    /// Guard: a different agent must validate than the one that implemented.
    fn implementer_separation_guard(&self, action: &Action, state: &RunnerState) -> Result<(), Refusal> {
        if let ActionKind::TransitionNode { new_status: pac_core::NodeStatus::Validated } = action.kind {
            if let (Some(agent_id), Some(implementer)) = (action.agent_id.as_deref(), state.implementer_map.get(action.node_id.as_str())) {
                if agent_id == implementer {
                    return Err(Refusal::new(format!("agent `{agent_id}` implemented `{}` and may not also validate it", action.node_id)));
                }
            }
        }
        Ok(())
    }

    /// Record the effect of an accepted, executed action: append an audit
    /// entry, mutate retry bookkeeping, and update the implementer map.
    /// `spot_check_roll` is a caller-supplied `[0,1)` draw so the spot-check
    /// behavior is deterministic under test.
    #[allow(clippy::too_many_arguments)]
    pub fn post_hook(
        &self,
        action: &Action,
        from_status: pac_core::NodeStatus,
        audit_log: &AuditLog,
        state: &mut RunnerState,
        agent_id: &str,
        now: chrono::DateTime<chrono::Utc>,
        spot_check_roll: f64,
    ) -> Result<(), pac_store::AuditError> {
        let ActionKind::TransitionNode { new_status } = action.kind else {
            return Ok(());
        };

        let payload = action.payload.clone().unwrap_or(serde_json::Value::Null);
        audit_log.append(action.node_id.as_str(), from_status, AuditStatus::from(new_status), agent_id, &payload, now)?;

        match new_status {
            pac_core::NodeStatus::Failed => {
                *state.retry_counts.entry(action.node_id.to_string()).or_insert(0) += 1;
            }
            pac_core::NodeStatus::Validated => {
                state.retry_counts.remove(action.node_id.as_str());
            }
            _ => {}
        }
        state.node_statuses.insert(action.node_id.to_string(), new_status);

        if spot_check_roll < self.config.spot_check_rate {
            audit_log.append(action.node_id.as_str(), new_status, AuditStatus::SpotCheckFlagged, agent_id, &payload, now)?;
        }

        Ok(())
    }

    /// Record that `agent_id` spawned the orchestrator implementing `node_id`
    /// (used later by the implementer-separation guard).
    pub fn record_implementer(&self, state: &mut RunnerState, node_id: &str, agent_id: &str) {
        state.implementer_map.insert(node_id.to_string(), agent_id.to_string());
    }
}
