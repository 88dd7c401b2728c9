// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Channel Bridge: translate between external chat
//! channels and internal runner signals.
//!
//! Registration is deliberately `&mut self` rather than behind a lock: the
//! bridge assumes a single owning event loop, made an explicit precondition
//! here by relying on ordinary borrow-checking instead of interior
//! mutability — there is no way to call `register` from two places at once
//! without the compiler noticing.

use chrono::{DateTime, Utc};
use pac_adapters::{Card, ChannelAdapter, ChannelError};
use pac_core::{Role, Signal, SignalType};
use pac_store::SignalStore;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// The closed inbound message classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Approval,
    Override,
    Shutdown,
    Guidance,
}

impl MessageType {
    fn as_payload_str(&self) -> &'static str {
        match self {
            MessageType::Approval => "approval",
            MessageType::Override => "override",
            MessageType::Shutdown => "shutdown",
            MessageType::Guidance => "guidance",
        }
    }
}

/// Tokenize the first word of `text` and classify it against the closed
/// inbound-command table, then extract `node_id`/`reason` for the types
/// that carry them.
fn tokenize(text: &str) -> (MessageType, Option<String>, Option<String>) {
    let mut tokens = text.split_whitespace();
    let first = tokens.next().unwrap_or("").to_lowercase();
    let message_type = match first.as_str() {
        "approve" | "approved" | "yes" | "lgtm" => MessageType::Approval,
        "reject" | "rejected" | "deny" | "no" => MessageType::Override,
        "stop" | "halt" | "shutdown" => MessageType::Shutdown,
        _ => MessageType::Guidance,
    };
    match message_type {
        MessageType::Approval => (message_type, tokens.next().map(str::to_string), None),
        MessageType::Override => {
            let node_id = tokens.next().map(str::to_string);
            let rest: Vec<&str> = tokens.collect();
            let reason = if rest.is_empty() { None } else { Some(rest.join(" ")) };
            (message_type, node_id, reason)
        }
        MessageType::Shutdown | MessageType::Guidance => (message_type, None, None),
    }
}

/// The fixed per-message-type acknowledgement string table.
fn acknowledgement(message_type: MessageType, routed: bool) -> String {
    if !routed {
        return "sorry, something went wrong relaying that".to_string();
    }
    match message_type {
        MessageType::Approval => "got it, approving.".to_string(),
        MessageType::Override => "got it, rejecting.".to_string(),
        MessageType::Shutdown => "shutting down as requested.".to_string(),
        MessageType::Guidance => "got it, passing that along.".to_string(),
    }
}

/// The `signal_type → (description, wants_card)` table, covering the closed
/// `SignalType` set.
fn describe(signal_type: SignalType) -> (&'static str, bool) {
    use SignalType::*;
    match signal_type {
        NeedsReview => ("needs review", false),
        NeedsInput => ("needs input", true),
        Violation => ("guard rail violation", true),
        OrchestratorStuck => ("orchestrator stuck", true),
        OrchestratorCrashed => ("orchestrator crashed", true),
        NodeComplete => ("node complete", false),
        ValidationPassed => ("validation passed", false),
        ValidationFailed => ("validation failed", true),
        InputResponse => ("input received", false),
        KillOrchestrator => ("orchestrator killed", false),
        Guidance => ("guidance sent", false),
        InboundCommand => ("inbound command received", false),
        RunnerStarted => ("pipeline started", false),
        RunnerHeartbeat => ("pipeline heartbeat", false),
        RunnerComplete => ("pipeline complete", true),
        RunnerStuck => ("pipeline stuck", true),
        RunnerError => ("pipeline error", true),
        RunnerUnregistered => ("pipeline unregistered", false),
        NodeSpawned => ("node spawned", false),
        NodeImplComplete => ("node implementation complete", false),
        NodeValidated => ("node validated", false),
        NodeFailed => ("node failed", true),
        AwaitingApproval => ("awaiting approval", true),
        Escalate => ("escalated to a human operator", true),
    }
}

/// The outcome of one inbound webhook delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundResult {
    pub acknowledgement: String,
    pub routed: bool,
}

/// The outcome of one outbound fan-out to a single registered channel.
pub struct BroadcastOutcome {
    pub channel: String,
    pub result: Result<(), ChannelError>,
}

pub struct ChannelBridge {
    adapters: HashMap<String, (Arc<dyn ChannelAdapter>, String)>,
    signal_store: SignalStore,
}

impl ChannelBridge {
    pub fn new(signals_dir: impl Into<PathBuf>) -> Self {
        Self { adapters: HashMap::new(), signal_store: SignalStore::new(signals_dir.into()) }
    }

    /// Register a channel's adapter and default recipient. Non-atomic:
    /// callers must not interleave this with `broadcast`/`handle_inbound`
    /// from another task (see module docs).
    pub fn register(&mut self, channel: impl Into<String>, adapter: Arc<dyn ChannelAdapter>, default_recipient: impl Into<String>) {
        self.adapters.insert(channel.into(), (adapter, default_recipient.into()));
    }

    pub fn unregister(&mut self, channel: &str) -> bool {
        self.adapters.remove(channel).is_some()
    }

    pub fn is_registered(&self, channel: &str) -> bool {
        self.adapters.contains_key(channel)
    }

    /// Inbound flow: verify, parse, classify, forward, ack.
    pub fn handle_inbound(&self, channel: &str, raw_payload: &[u8], now: DateTime<Utc>) -> InboundResult {
        let Some((adapter, _)) = self.adapters.get(channel) else {
            return InboundResult { acknowledgement: "unknown channel".to_string(), routed: false };
        };

        if !adapter.verify_webhook(raw_payload) {
            return InboundResult { acknowledgement: "rejected: could not verify webhook".to_string(), routed: false };
        }

        let Some(message) = adapter.parse_inbound(raw_payload) else {
            return InboundResult { acknowledgement: "rejected: could not parse message".to_string(), routed: false };
        };

        let (message_type, node_id, reason) = tokenize(&message.text);
        let mut payload = serde_json::json!({
            "message_type": message_type.as_payload_str(),
            "sender": message.sender,
            "thread_id": message.thread_id,
        });
        if let Some(node_id) = &node_id {
            payload["node_id"] = serde_json::Value::String(node_id.clone());
        }
        if let Some(reason) = &reason {
            payload["reason"] = serde_json::Value::String(reason.clone());
        }

        let signal = Signal::new(Role::Channel, Role::Runner, SignalType::InboundCommand, payload, now);
        let routed = self.signal_store.write(&signal).is_ok();
        InboundResult { acknowledgement: acknowledgement(message_type, routed), routed }
    }

    /// Outbound flow: format once, render a card from the
    /// first card-capable adapter, fan out concurrently, collect per-channel
    /// results without one failure blocking the others.
    pub async fn broadcast(&self, signal_type: SignalType, payload: serde_json::Value, pipeline_status: Option<serde_json::Value>) -> Vec<BroadcastOutcome> {
        let (description, wants_card) = describe(signal_type);
        let text = format!("{description}: {payload}");
        let card: Option<Card> = if wants_card {
            pipeline_status.as_ref().and_then(|status| self.adapters.values().find(|(a, _)| a.supports_cards()).and_then(|(a, _)| a.render_card(status)))
        } else {
            None
        };

        let mut set = tokio::task::JoinSet::new();
        for (channel, (adapter, recipient)) in &self.adapters {
            let adapter = Arc::clone(adapter);
            let recipient = recipient.clone();
            let channel = channel.clone();
            let text = text.clone();
            let card = card.clone();
            set.spawn(async move {
                let result = match &card {
                    Some(card) => adapter.send_card(&recipient, card).await,
                    None => adapter.send_text(&recipient, &text).await,
                };
                BroadcastOutcome { channel, result }
            });
        }

        let mut outcomes = Vec::with_capacity(set.len());
        while let Some(joined) = set.join_next().await {
            if let Ok(outcome) = joined {
                outcomes.push(outcome);
            }
        }
        outcomes
    }
}
