// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Pipeline Runner: one cycle reads the DAG and
//! persisted state, composes a [`Plan`], gates every action through
//! [`GuardRails`], executes what survives, and persists the result.

use crate::hooks::GuardRails;
use crate::signals::{self, Disposition};
use pac_core::plan::{Action, ActionKind, BlockedNode, Plan, Priority, Stage};
use pac_core::{Clock, Dag, Handler, NodeStatus, PacConfig, Role, RunnerState, Signal, SignalType};
use pac_adapters::SessionHost;
use pac_store::{AuditLog, SignalStore};
use rand::Rng;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to load the DAG: {0}")]
    DagLoad(#[from] pac_dag::DagLoadError),
    #[error("runner state error: {0}")]
    State(#[from] pac_store::RunnerStateError),
    #[error("signal store error: {0}")]
    Signal(#[from] pac_store::SignalStoreError),
    #[error("audit log error: {0}")]
    Audit(#[from] pac_store::AuditError),
    #[error("session host error: {0}")]
    SessionHost(#[from] pac_adapters::SessionHostError),
}

/// Everything one `cycle()` call needs that is not purely in-memory.
pub struct PipelineRunner<C: Clock> {
    config: PacConfig,
    clock: C,
    session_host: Arc<dyn SessionHost>,
    signal_store: SignalStore,
    audit_log: AuditLog,
    working_dir: std::path::PathBuf,
}

impl<C: Clock> PipelineRunner<C> {
    pub fn new(
        config: PacConfig,
        clock: C,
        session_host: Arc<dyn SessionHost>,
        signal_store: SignalStore,
        audit_log: AuditLog,
        working_dir: impl Into<std::path::PathBuf>,
    ) -> Self {
        Self { config, clock, session_host, signal_store, audit_log, working_dir: working_dir.into() }
    }

    /// One iteration of the reactive planning loop:
    /// 1. load the DAG and overlay persisted status
    /// 2. ingest inbound signals into candidate actions
    /// 3. compose a rule-ordered plan
    /// 4. gate every action through the guard rails
    /// 5. execute what survives
    /// 6. persist `RunnerState` atomically
    pub async fn cycle(&self, dag_path: &Path, state: &mut RunnerState) -> Result<Plan, RunnerError> {
        let now = self.clock.now();
        let mut dag = pac_dag::load(dag_path)?;
        dag.apply_overlay(&state.node_statuses, &state.retry_counts);
        self.auto_validate_structural_markers(&mut dag, state, now)?;

        let inbound = self.drain_inbound_signals()?;
        let rails = GuardRails::new(&self.config);

        let mut plan = Plan::empty(state.pipeline_id.clone(), Stage::Execute);
        let mut candidates: Vec<Action> = Vec::new();

        for (path, signal) in &inbound {
            if let Disposition::Act(action) = signals::translate(signal) {
                candidates.push(action);
            }
            self.signal_store.consume(path)?;
        }
        candidates.extend(self.derive_actions(&dag));

        if dag.is_complete() {
            plan.pipeline_complete = true;
            plan.current_stage = Stage::Finalize;
            plan.summary = "every terminal-exit node is validated".to_string();
            plan.actions.push(Action::new(ActionKind::SignalFinalize, pac_core::NodeId::new("*"), "pipeline complete"));
        }

        let stuck = dag.stuck_nodes(self.config.max_retries);
        if !plan.pipeline_complete && !stuck.is_empty() {
            // signal_stuck never shares a cycle with a progress-advancing action.
            let (node, reason) = &stuck[0];
            plan.current_stage = Stage::AwaitValidation;
            plan.summary = format!("node `{}` is stuck: {reason}", node.id);
            plan.actions.push(Action::new(ActionKind::SignalStuck, node.id.clone(), reason.clone()).with_priority(Priority::High));
        }

        if !plan.pipeline_complete && plan.actions.is_empty() {
            for action in candidates {
                match rails.pre_hook(&action, &dag, state, now) {
                    Ok(()) => plan.actions.push(action),
                    Err(refusal) => plan.blocked_nodes.push(BlockedNode { node_id: action.node_id.clone(), reason: refusal.0 }),
                }
            }
            if plan.actions.is_empty() {
                plan.summary = "nothing actionable; wait and observe".to_string();
            } else {
                plan.summary = format!("{} action(s) accepted for execution", plan.actions.len());
            }
        }

        for action in &plan.actions {
            if action.kind.is_terminal_only() {
                continue;
            }
            self.execute_action(action, &now).await?;
            let from_status = dag.node(&action.node_id).map(|n| n.status).unwrap_or(NodeStatus::Pending);
            let agent_id = action.agent_id.clone().unwrap_or_else(|| "runner".to_string());

            if let ActionKind::TransitionNode { .. } = action.kind {
                let roll: f64 = rand::thread_rng().gen();
                rails.post_hook(action, from_status, &self.audit_log, state, &agent_id, now, roll)?;
            } else if matches!(action.kind, ActionKind::SpawnOrchestrator | ActionKind::DispatchValidation) {
                // Spawning moves the node to `active`; this is not gated by the
                // guard rails the way a worker-reported transition is, so it is
                // recorded directly rather than through `post_hook`.
                self.audit_log.append(action.node_id.as_str(), from_status, pac_core::AuditStatus::Active, &agent_id, &serde_json::Value::Null, now)?;
                state.node_statuses.insert(action.node_id.to_string(), NodeStatus::Active);
                if matches!(action.kind, ActionKind::SpawnOrchestrator) {
                    rails.record_implementer(state, action.node_id.as_str(), &agent_id);
                }
            }
        }

        let mut completed_nodes: Vec<pac_core::NodeId> = dag
            .nodes
            .keys()
            .filter(|id| {
                state
                    .node_statuses
                    .get(id.as_str())
                    .copied()
                    .unwrap_or_else(|| dag.node(id).map(|n| n.status).unwrap_or(NodeStatus::Pending))
                    == NodeStatus::Validated
            })
            .cloned()
            .collect();
        completed_nodes.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        plan.completed_nodes = completed_nodes;

        plan.retry_counts = state.retry_counts.clone();
        state.last_plan = Some(plan.clone());
        state.updated_at = now;
        Ok(plan)
    }

    /// Pull every signal addressed to the Runner off the bus.
    fn drain_inbound_signals(&self) -> Result<Vec<(std::path::PathBuf, Signal)>, RunnerError> {
        Ok(self.signal_store.list(Role::Runner)?)
    }

    /// Structural marker nodes (terminal-entry/terminal-exit) carry no work
    /// of their own, so once ready they validate immediately rather than
    /// waiting a cycle for a visible `transition_node` action to clear them.
    /// Validating one marker can ready another directly behind it (a
    /// terminal-exit with no code-generator between it and a just-validated
    /// terminal-entry), so this loops to a fixed point before the cycle goes
    /// on to derive code-generator readiness.
    fn auto_validate_structural_markers(&self, dag: &mut Dag, state: &mut RunnerState, now: chrono::DateTime<chrono::Utc>) -> Result<(), RunnerError> {
        loop {
            let ready_markers: Vec<pac_core::NodeId> = dag
                .ready_nodes()
                .into_iter()
                .filter(|n| matches!(n.handler, Handler::TerminalEntry | Handler::TerminalExit))
                .map(|n| n.id.clone())
                .collect();
            if ready_markers.is_empty() {
                break;
            }
            for id in ready_markers {
                let from_status = dag.node(&id).map(|n| n.status).unwrap_or(NodeStatus::Pending);
                self.audit_log.append(id.as_str(), from_status, pac_core::AuditStatus::Validated, "runner", &serde_json::Value::Null, now)?;
                if let Some(node) = dag.nodes.get_mut(&id) {
                    node.status = NodeStatus::Validated;
                }
                state.node_statuses.insert(id.to_string(), NodeStatus::Validated);
                state.retry_counts.remove(id.as_str());
            }
        }
        Ok(())
    }

    /// DAG-driven candidate actions: code-generator nodes ready to start, and
    /// impl_complete nodes whose successor is a `human-wait`/
    /// `automated-validator` node. Structural marker nodes never appear here;
    /// they are auto-validated earlier in the cycle.
    fn derive_actions(&self, dag: &Dag) -> Vec<Action> {
        let mut actions = Vec::new();
        for node in dag.ready_nodes() {
            match node.handler {
                Handler::CodeGenerator => {
                    actions.push(Action::new(ActionKind::SpawnOrchestrator, node.id.clone(), "predecessors validated, ready to implement"));
                }
                Handler::TerminalEntry | Handler::TerminalExit | Handler::AutomatedValidator | Handler::HumanWait | Handler::DecisionBranch => {}
            }
        }
        for node in dag.nodes.values() {
            if node.status != NodeStatus::ImplComplete {
                continue;
            }
            let has_validation_successor =
                dag.successors(&node.id).any(|s| dag.node(s).map(|n| matches!(n.handler, Handler::HumanWait | Handler::AutomatedValidator)).unwrap_or(false));
            if has_validation_successor {
                actions.push(Action::new(ActionKind::DispatchValidation, node.id.clone(), "implementation complete, dispatching validation"));
            }
        }
        actions.sort_by(|a, b| a.node_id.as_str().cmp(b.node_id.as_str()));
        actions
    }

    /// Carry out a non-`TransitionNode` action against the session host; a
    /// `TransitionNode` action has no side effect of its own beyond the audit
    /// entry and state mutation `post_hook` performs.
    async fn execute_action(&self, action: &Action, now: &chrono::DateTime<chrono::Utc>) -> Result<(), RunnerError> {
        match &action.kind {
            ActionKind::SpawnOrchestrator => {
                let session_name = format!("impl-{}", action.node_id);
                if !self.session_host.is_alive(&session_name).await? {
                    self.session_host.spawn(&session_name, &self.working_dir, None).await?;
                }
            }
            ActionKind::DispatchValidation => {
                let session_name = format!("validate-{}", action.node_id);
                if !self.session_host.is_alive(&session_name).await? {
                    self.session_host.spawn(&session_name, &self.working_dir, None).await?;
                }
            }
            ActionKind::SendGuidance => {
                if let Some(agent_id) = &action.agent_id {
                    self.session_host.send(agent_id, &action.reason).await?;
                }
            }
            ActionKind::AskHuman => {
                let sig = Signal::new(Role::Runner, Role::Channel, SignalType::NeedsInput, action.payload.clone().unwrap_or_default(), *now);
                self.signal_store.write(&sig)?;
            }
            ActionKind::TransitionNode { .. } | ActionKind::SignalFinalize | ActionKind::SignalStuck => {}
        }
        Ok(())
    }
}
