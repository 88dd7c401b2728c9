// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Guardian: a read-only sibling monitor for one spawned
//! worker. It never mutates the Runner's persisted `RunnerState` directly —
//! every effect it has on a pipeline travels as a signal the Runner picks up
//! and runs through its own guard rails on its next cycle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pac_adapters::SessionHost;
use pac_core::{Identity, NodeId, PacConfig, Role, Signal, SignalType};
use pac_store::{AuditLog, ChainVerdict, IdentityRegistry, RunnerStateStore, SignalStore};
use pac_wire::{AuditEntryView, ChainVerdictView, PipelineHealthView};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GuardianError {
    #[error("runner state error: {0}")]
    State(#[from] pac_store::RunnerStateError),
    #[error("audit log error: {0}")]
    Audit(#[from] pac_store::AuditError),
    #[error("signal store error: {0}")]
    Signal(#[from] pac_store::SignalStoreError),
    #[error("identity registry error: {0}")]
    Identity(#[from] pac_store::IdentityError),
}

/// The outcome a completed or failed validation hook reports for one node.
pub enum ValidationOutcome {
    Pass,
    Fail(String),
}

/// The configured validation hook the reaction loop runs on a `NEEDS_REVIEW`
/// signal. Concrete hooks (shelling out to a test suite, invoking a linter)
/// are out of scope; this is the seam they plug into.
#[async_trait]
pub trait ValidationHook: Send + Sync {
    async fn validate(&self, node_id: &NodeId, payload: &serde_json::Value) -> Result<ValidationOutcome, String>;
}

/// A hook that always passes, for pipelines with no automated validation
/// configured (mirrors the fail-open default the Completion Judge uses).
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysPassHook;

#[async_trait]
impl ValidationHook for AlwaysPassHook {
    async fn validate(&self, _node_id: &NodeId, _payload: &serde_json::Value) -> Result<ValidationOutcome, String> {
        Ok(ValidationOutcome::Pass)
    }
}

/// What `Guardian::respond` writes back to the Runner. Approval and
/// rejection land as `VALIDATION_PASSED`/`VALIDATION_FAILED` signals, which
/// `pac_engine::signals::translate` already turns into guarded
/// `transition_node` actions.
pub enum Verdict {
    Approved { node_id: NodeId, agent_id: Option<String> },
    Rejected { node_id: NodeId, reason: String, agent_id: Option<String> },
    Guidance { node_id: NodeId, message: String },
}

/// What `react_once` observed for one iteration of the per-worker loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionOutcome {
    Handled,
    Idle,
    WorkerGone,
}

pub struct Guardian {
    config: PacConfig,
    state_dir: PathBuf,
    state_store: RunnerStateStore,
    signal_store: SignalStore,
}

impl Guardian {
    pub fn new(config: PacConfig, state_dir: impl Into<PathBuf>, signals_dir: impl Into<PathBuf>) -> Self {
        let state_dir = state_dir.into();
        Self { state_store: RunnerStateStore::new(state_dir.clone()), signal_store: SignalStore::new(signals_dir.into()), config, state_dir }
    }

    fn audit_log(&self, pipeline_id: &str) -> AuditLog {
        AuditLog::new(self.state_dir.join(format!("{pipeline_id}-audit.jsonl")))
    }

    /// `status(pipeline_id) → Health`.
    pub fn status(&self, pipeline_id: &str, now: DateTime<Utc>) -> Result<PipelineHealthView, GuardianError> {
        let state = self.state_store.load(pipeline_id)?;
        Ok(PipelineHealthView::compute(&state, now, &self.config))
    }

    /// `list_pipelines() → [Health]`, sorted by `updated_at` descending.
    pub fn list_pipelines(&self, now: DateTime<Utc>) -> Result<Vec<PipelineHealthView>, GuardianError> {
        let mut states = self.state_store.list_all()?;
        states.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(states.iter().map(|s| PipelineHealthView::compute(s, now, &self.config)).collect())
    }

    /// `verify_chain(pipeline_id) → (ok, message)`, delegating to C2.
    pub fn verify_chain(&self, pipeline_id: &str) -> Result<ChainVerdictView, GuardianError> {
        Ok(match self.audit_log(pipeline_id).verify_chain()? {
            ChainVerdict::Intact => ChainVerdictView::intact(),
            ChainVerdict::Broken { line, reason } => ChainVerdictView::broken(line, reason),
        })
    }

    /// The last `n` audit entries, oldest-first, for `guardian audit --tail N`.
    pub fn audit_tail(&self, pipeline_id: &str, n: usize) -> Result<Vec<AuditEntryView>, GuardianError> {
        Ok(self.audit_log(pipeline_id).tail(n)?.iter().map(AuditEntryView::from).collect())
    }

    /// `respond(worker, verdict)`: write an approval/override/guidance signal
    /// targeting the Runner.
    pub fn respond(&self, verdict: Verdict, now: DateTime<Utc>) -> Result<(), GuardianError> {
        let signal = match verdict {
            Verdict::Approved { node_id, agent_id } => {
                Signal::new(Role::Guardian, Role::Runner, SignalType::ValidationPassed, review_payload(&node_id, agent_id, None), now)
            }
            Verdict::Rejected { node_id, reason, agent_id } => {
                Signal::new(Role::Guardian, Role::Runner, SignalType::ValidationFailed, review_payload(&node_id, agent_id, Some(reason)), now)
            }
            Verdict::Guidance { node_id, message } => {
                Signal::new(Role::Guardian, Role::Runner, SignalType::Guidance, serde_json::json!({"node_id": node_id.as_str(), "message": message}), now)
            }
        };
        self.signal_store.write(&signal)?;
        Ok(())
    }

    /// `escalate_to_terminal(pipeline_id, issue, options)`: write a signal
    /// targeting the human-operator role.
    pub fn escalate_to_terminal(&self, pipeline_id: &str, issue: impl Into<String>, options: Vec<String>, now: DateTime<Utc>) -> Result<(), GuardianError> {
        let payload = serde_json::json!({"pipeline_id": pipeline_id, "issue": issue.into(), "options": options});
        self.signal_store.write(&Signal::new(Role::Guardian, Role::Terminal, SignalType::Escalate, payload, now))?;
        Ok(())
    }

    /// One iteration of the per-worker reaction loop: wait for the next
    /// signal addressed to the Guardian, and if none arrives within
    /// `wait_timeout`, check whether `worker_session` is still alive.
    pub async fn react_once(
        &self,
        worker_session: &str,
        session_host: &dyn SessionHost,
        hook: &dyn ValidationHook,
        wait_timeout: Duration,
    ) -> Result<ReactionOutcome, GuardianError> {
        match self.signal_store.wait(Role::Guardian, wait_timeout, Duration::from_millis(200))? {
            Some((path, signal)) => {
                self.signal_store.consume(&path)?;
                self.handle_signal(&signal, hook).await?;
                Ok(ReactionOutcome::Handled)
            }
            None => {
                if session_host.is_alive(worker_session).await.unwrap_or(true) {
                    Ok(ReactionOutcome::Idle)
                } else {
                    Ok(ReactionOutcome::WorkerGone)
                }
            }
        }
    }

    async fn handle_signal(&self, signal: &Signal, hook: &dyn ValidationHook) -> Result<(), GuardianError> {
        let now = Utc::now();
        match signal.signal_type {
            SignalType::NeedsReview => {
                let node_id = node_id_of(signal).unwrap_or_else(|| NodeId::new("unknown"));
                let agent_id = signal.payload.get("agent_id").and_then(|v| v.as_str()).map(str::to_string);
                match hook.validate(&node_id, &signal.payload).await {
                    Ok(ValidationOutcome::Pass) => self.respond(Verdict::Approved { node_id, agent_id }, now)?,
                    Ok(ValidationOutcome::Fail(reason)) => self.respond(Verdict::Rejected { node_id, reason, agent_id }, now)?,
                    Err(reason) => self.respond(Verdict::Rejected { node_id, reason, agent_id }, now)?,
                }
            }
            SignalType::NeedsInput => {
                let pipeline_id = signal.payload.get("pipeline_id").and_then(|v| v.as_str()).unwrap_or("unknown");
                let issue = signal.payload.get("issue").and_then(|v| v.as_str()).unwrap_or("worker needs input").to_string();
                self.escalate_to_terminal(pipeline_id, issue, Vec::new(), now)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Escalate every identity whose heartbeat is older than `timeout`.
    pub fn escalate_stale_workers(&self, identities: &IdentityRegistry, now: DateTime<Utc>, timeout: Duration) -> Result<Vec<Identity>, GuardianError> {
        let stale: Vec<Identity> = identities.list_all()?.into_iter().filter(|i| i.is_stale(now, timeout)).collect();
        for identity in &stale {
            self.escalate_to_terminal(&identity.session_id, format!("worker `{}` has not sent a heartbeat recently", identity.name), Vec::new(), now)?;
        }
        Ok(stale)
    }
}

fn node_id_of(signal: &Signal) -> Option<NodeId> {
    signal.payload.get("node_id").and_then(|v| v.as_str()).map(NodeId::new)
}

fn review_payload(node_id: &NodeId, agent_id: Option<String>, reason: Option<String>) -> serde_json::Value {
    let mut payload = serde_json::json!({"node_id": node_id.as_str()});
    if let Some(agent_id) = agent_id {
        payload["agent_id"] = serde_json::Value::String(agent_id);
    }
    if let Some(reason) = reason {
        payload["reason"] = serde_json::Value::String(reason);
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use pac_adapters::FakeSessionHost;

    fn guardian(dir: &tempfile::TempDir) -> Guardian {
        Guardian::new(PacConfig::default(), dir.path().join("state"), dir.path().join("signals"))
    }

    #[test]
    fn status_reports_healthy_for_a_fresh_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let guardian = guardian(&dir);
        let now = Utc::now();
        let store = RunnerStateStore::new(dir.path().join("state"));
        store.save(&pac_core::RunnerState::new("pipe-1", "p.dag", "sess-1", now)).unwrap();

        let view = guardian.status("pipe-1", now).unwrap();
        assert_eq!(view.health, pac_wire::Health::Healthy);
    }

    #[test]
    fn verify_chain_on_empty_log_is_intact() {
        let dir = tempfile::tempdir().unwrap();
        let guardian = guardian(&dir);
        let verdict = guardian.verify_chain("pipe-1").unwrap();
        assert!(verdict.ok);
    }

    #[test]
    fn respond_approved_writes_validation_passed_signal() {
        let dir = tempfile::tempdir().unwrap();
        let guardian = guardian(&dir);
        let now = Utc::now();
        guardian.respond(Verdict::Approved { node_id: NodeId::new("impl_a"), agent_id: Some("ag-1".to_string()) }, now).unwrap();

        let signal_store = SignalStore::new(dir.path().join("signals"));
        let pending = signal_store.list(Role::Runner).unwrap();
        assert_eq!(pending.len(), 1);
        assert!(matches!(pending[0].1.signal_type, SignalType::ValidationPassed));
    }

    #[test]
    fn escalate_to_terminal_writes_escalate_signal() {
        let dir = tempfile::tempdir().unwrap();
        let guardian = guardian(&dir);
        guardian.escalate_to_terminal("pipe-1", "needs input", vec!["retry".to_string()], Utc::now()).unwrap();

        let signal_store = SignalStore::new(dir.path().join("signals"));
        let pending = signal_store.list(Role::Terminal).unwrap();
        assert_eq!(pending.len(), 1);
        assert!(matches!(pending[0].1.signal_type, SignalType::Escalate));
    }

    #[tokio::test]
    async fn react_once_is_idle_when_no_signal_and_session_alive() {
        let dir = tempfile::tempdir().unwrap();
        let guardian = guardian(&dir);
        let host = FakeSessionHost::new();
        host.spawn("impl-a", dir.path(), None).await.unwrap();

        let outcome = guardian.react_once("impl-a", &host, &AlwaysPassHook, Duration::from_millis(50)).await.unwrap();
        assert_eq!(outcome, ReactionOutcome::Idle);
    }

    #[tokio::test]
    async fn react_once_reports_worker_gone_when_session_dead() {
        let dir = tempfile::tempdir().unwrap();
        let guardian = guardian(&dir);
        let host = FakeSessionHost::new();

        let outcome = guardian.react_once("never-spawned", &host, &AlwaysPassHook, Duration::from_millis(50)).await.unwrap();
        assert_eq!(outcome, ReactionOutcome::WorkerGone);
    }

    #[tokio::test]
    async fn react_once_handles_needs_review_by_approving() {
        let dir = tempfile::tempdir().unwrap();
        let guardian = guardian(&dir);
        let host = FakeSessionHost::new();
        host.spawn("impl-a", dir.path(), None).await.unwrap();

        let signal_store = SignalStore::new(dir.path().join("signals"));
        signal_store
            .write(&Signal::new(Role::Runner, Role::Guardian, SignalType::NeedsReview, serde_json::json!({"node_id": "impl_a"}), Utc::now()))
            .unwrap();

        let outcome = guardian.react_once("impl-a", &host, &AlwaysPassHook, Duration::from_millis(50)).await.unwrap();
        assert_eq!(outcome, ReactionOutcome::Handled);

        let pending = signal_store.list(Role::Runner).unwrap();
        assert_eq!(pending.len(), 1);
        assert!(matches!(pending[0].1.signal_type, SignalType::ValidationPassed));
    }
}
