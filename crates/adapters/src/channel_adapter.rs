// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ChannelAdapter`: the capability the Channel Bridge (C9) fans outbound
//! messages across. Concrete adapters for specific chat
//! providers are explicitly out of scope; this crate ships a
//! logging adapter and a webhook adapter as the two generic implementations.

use crate::error::ChannelError;
use async_trait::async_trait;
use serde_json::Value;

/// A rendered "card": a provider-agnostic rich message. Only adapters that
/// `supports_cards()` are asked to render one.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub title: String,
    pub body: String,
    pub fields: Vec<(String, String)>,
}

/// A generic inbound message, after a channel-specific adapter has parsed its
/// provider's webhook payload.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub text: String,
    pub sender: String,
    pub thread_id: Option<String>,
    pub metadata: serde_json::Map<String, Value>,
}

#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Plain-text send to `recipient`.
    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), ChannelError>;

    /// Whether this adapter can render a [`Card`].
    fn supports_cards(&self) -> bool {
        false
    }

    /// Render `status` (a pipeline-status snapshot) into a card. Only called
    /// when `supports_cards()` is true.
    fn render_card(&self, status: &Value) -> Option<Card> {
        let _ = status;
        None
    }

    /// Send a pre-rendered card, for adapters that support them.
    async fn send_card(&self, recipient: &str, card: &Card) -> Result<(), ChannelError> {
        self.send_text(recipient, &format!("{}\n{}", card.title, card.body)).await
    }

    /// Verify an inbound webhook's authenticity. Provider-specific (HMAC
    /// signature headers, shared secrets, ...); the generic adapters accept
    /// everything, since concrete chat-provider integrations are out of
    /// scope.
    fn verify_webhook(&self, raw_payload: &[u8]) -> bool {
        let _ = raw_payload;
        true
    }

    /// Parse a raw webhook body into a generic [`InboundMessage`]. The
    /// default expects `{"text", "sender", "thread_id"}` JSON, which a
    /// concrete provider adapter would replace with its own schema.
    fn parse_inbound(&self, raw_payload: &[u8]) -> Option<InboundMessage> {
        let value: Value = serde_json::from_slice(raw_payload).ok()?;
        Some(InboundMessage {
            text: value.get("text")?.as_str()?.to_string(),
            sender: value.get("sender").and_then(|s| s.as_str()).unwrap_or("unknown").to_string(),
            thread_id: value.get("thread_id").and_then(|s| s.as_str()).map(String::from),
            metadata: value.as_object().cloned().unwrap_or_default(),
        })
    }
}

/// Logs every outbound message at `info` level. Grounded on the desktop
/// notify adapter's fire-and-forget style; useful as a default adapter when
/// no real chat provider is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingChannelAdapter;

impl LoggingChannelAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChannelAdapter for LoggingChannelAdapter {
    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), ChannelError> {
        tracing::info!(recipient, text, "outbound channel message");
        Ok(())
    }
}

/// Posts a JSON payload to a webhook URL. Verification of inbound payloads
/// is the Channel Bridge's job, not the
/// adapter's; this type only covers the outbound half.
#[derive(Clone, Debug)]
pub struct WebhookChannelAdapter {
    url: String,
}

impl WebhookChannelAdapter {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl ChannelAdapter for WebhookChannelAdapter {
    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), ChannelError> {
        let client = reqwest::Client::new();
        let body = serde_json::json!({ "recipient": recipient, "text": text });
        client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed { channel: self.url.clone(), reason: e.to_string() })?
            .error_for_status()
            .map_err(|e| ChannelError::SendFailed { channel: self.url.clone(), reason: e.to_string() })?;
        Ok(())
    }

    fn supports_cards(&self) -> bool {
        true
    }

    fn render_card(&self, status: &Value) -> Option<Card> {
        let pipeline_id = status.get("pipeline_id")?.as_str()?.to_string();
        let summary = status.get("summary").and_then(|v| v.as_str()).unwrap_or("").to_string();
        Some(Card {
            title: format!("pipeline {pipeline_id}"),
            body: summary,
            fields: Vec::new(),
        })
    }
}

/// Fires a desktop notification for every outbound message. Useful as a
/// zero-configuration channel when no chat provider is registered; never
/// supports cards since desktop notifications have no rich-layout surface.
///
/// Notifications are sent from `tokio::task::spawn_blocking` because
/// `notify-rust`'s `show()` is synchronous, and on macOS the first call
/// would otherwise block the async runtime on an AppleScript bundle-id
/// lookup inside a daemon process lacking Automation permissions.
#[derive(Clone, Copy, Debug, Default)]
pub struct DesktopChannelAdapter;

impl DesktopChannelAdapter {
    pub fn new() -> Self {
        #[cfg(target_os = "macos")]
        {
            let _ = mac_notification_sys::set_application("com.apple.Terminal");
        }
        Self
    }
}

#[async_trait]
impl ChannelAdapter for DesktopChannelAdapter {
    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), ChannelError> {
        let title = recipient.to_string();
        let body = text.to_string();
        tokio::task::spawn_blocking(move || match notify_rust::Notification::new().summary(&title).body(&body).show() {
            Ok(_) => tracing::info!(%title, "desktop notification sent"),
            Err(e) => tracing::warn!(%title, error = %e, "desktop notification failed"),
        });
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    pub struct SentMessage {
        pub recipient: String,
        pub text: String,
    }

    /// Records every send instead of performing it; also configurable to
    /// fail, for exercising the Channel Bridge's per-adapter error isolation.
    #[derive(Clone, Default)]
    pub struct FakeChannelAdapter {
        sent: Arc<Mutex<Vec<SentMessage>>>,
        supports_cards: bool,
        fail: bool,
    }

    impl FakeChannelAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_cards(mut self) -> Self {
            self.supports_cards = true;
            self
        }

        pub fn failing(mut self) -> Self {
            self.fail = true;
            self
        }

        pub fn sent(&self) -> Vec<SentMessage> {
            self.sent.lock().clone()
        }
    }

    #[async_trait]
    impl ChannelAdapter for FakeChannelAdapter {
        async fn send_text(&self, recipient: &str, text: &str) -> Result<(), ChannelError> {
            if self.fail {
                return Err(ChannelError::SendFailed { channel: "fake".to_string(), reason: "forced failure".to_string() });
            }
            self.sent.lock().push(SentMessage { recipient: recipient.to_string(), text: text.to_string() });
            Ok(())
        }

        fn supports_cards(&self) -> bool {
            self.supports_cards
        }

        fn render_card(&self, status: &Value) -> Option<Card> {
            let pipeline_id = status.get("pipeline_id")?.as_str()?.to_string();
            Some(Card { title: pipeline_id, body: String::new(), fields: Vec::new() })
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeChannelAdapter, SentMessage};

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_adapter_records_sent_text() {
        let adapter = FakeChannelAdapter::new();
        adapter.send_text("#general", "hello").await.unwrap();
        assert_eq!(adapter.sent(), vec![SentMessage { recipient: "#general".to_string(), text: "hello".to_string() }]);
    }

    #[tokio::test]
    async fn failing_adapter_errors() {
        let adapter = FakeChannelAdapter::new().failing();
        assert!(adapter.send_text("#general", "hello").await.is_err());
    }

    #[test]
    fn card_support_is_opt_in() {
        assert!(!FakeChannelAdapter::new().supports_cards());
        assert!(FakeChannelAdapter::new().with_cards().supports_cards());
    }

    #[test]
    fn default_parse_inbound_reads_text_sender_thread() {
        let adapter = FakeChannelAdapter::new();
        let raw = br#"{"text": "approve impl_a", "sender": "alice", "thread_id": "t-1"}"#;
        let msg = adapter.parse_inbound(raw).unwrap();
        assert_eq!(msg.text, "approve impl_a");
        assert_eq!(msg.sender, "alice");
        assert_eq!(msg.thread_id.as_deref(), Some("t-1"));
    }

    #[test]
    fn default_parse_inbound_rejects_missing_text() {
        let adapter = FakeChannelAdapter::new();
        assert!(adapter.parse_inbound(br#"{"sender": "alice"}"#).is_none());
    }

    #[test]
    fn default_verify_webhook_accepts_everything() {
        let adapter = FakeChannelAdapter::new();
        assert!(adapter.verify_webhook(b"anything"));
    }
}
