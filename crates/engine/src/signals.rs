// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Translate inbound signals addressed to the Runner into `transition_node`
//! actions, so worker/guardian reports flow through the same guard-rail
//! pipeline as Runner-originated actions.

use pac_core::plan::{Action, ActionKind};
use pac_core::{NodeId, NodeStatus, Signal, SignalType};

/// What to do with one inbound signal: turn it into a guarded action, or
/// merely consume it (informational signals the Runner does not act on).
pub enum Disposition {
    Act(Action),
    Ignore,
}

/// Map a signal targeting `Role::Runner` to the action it proposes, if any.
/// `INBOUND_COMMAND` carries the Channel Bridge's classification in its
/// payload (`message_type`, `node_id`, `reason`).
pub fn translate(signal: &Signal) -> Disposition {
    let payload = &signal.payload;
    let node_id = || payload.get("node_id").and_then(|v| v.as_str()).map(NodeId::new);
    let agent_id = || payload.get("agent_id").and_then(|v| v.as_str()).map(str::to_string);
    let evidence_timestamp = || {
        payload
            .get("evidence_timestamp")
            .and_then(|v| v.as_str())
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&chrono::Utc))
    };

    let transition = |node: NodeId, new_status: NodeStatus, reason: &str| {
        let mut action = Action::new(ActionKind::TransitionNode { new_status }, node, reason);
        action.agent_id = agent_id();
        action.evidence_timestamp = evidence_timestamp();
        action.payload = Some(payload.clone());
        Disposition::Act(action)
    };

    match signal.signal_type {
        SignalType::NodeImplComplete => node_id().map(|n| transition(n, NodeStatus::ImplComplete, "worker reported impl_complete")).unwrap_or(Disposition::Ignore),
        SignalType::NodeValidated | SignalType::ValidationPassed => node_id().map(|n| transition(n, NodeStatus::Validated, "validation passed")).unwrap_or(Disposition::Ignore),
        SignalType::NodeFailed | SignalType::ValidationFailed => node_id().map(|n| transition(n, NodeStatus::Failed, "validation or implementation failed")).unwrap_or(Disposition::Ignore),
        SignalType::InboundCommand => translate_inbound_command(payload),
        _ => Disposition::Ignore,
    }
}

fn translate_inbound_command(payload: &serde_json::Value) -> Disposition {
    let message_type = payload.get("message_type").and_then(|v| v.as_str()).unwrap_or("guidance");
    let Some(node_id) = payload.get("node_id").and_then(|v| v.as_str()).map(NodeId::new) else {
        return Disposition::Ignore;
    };
    match message_type {
        "approval" => {
            let mut action = Action::new(ActionKind::TransitionNode { new_status: NodeStatus::Validated }, node_id, "approved via inbound command");
            action.payload = Some(payload.clone());
            Disposition::Act(action)
        }
        "override" => {
            let reason = payload.get("reason").and_then(|v| v.as_str()).unwrap_or("rejected via inbound command").to_string();
            let mut action = Action::new(ActionKind::TransitionNode { new_status: NodeStatus::Failed }, node_id, reason);
            action.payload = Some(payload.clone());
            Disposition::Act(action)
        }
        _ => Disposition::Ignore,
    }
}
