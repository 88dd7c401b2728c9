// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session Host Adapter: an abstract capability for
//! spawning, messaging, and supervising named long-lived worker sessions.
//! The core never talks to a terminal multiplexer directly — only through
//! this trait.

use crate::error::SessionHostError;
use async_trait::async_trait;
use std::path::Path;

/// Outcome of a `respawn` call that did not error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespawnOutcome {
    AlreadyAlive,
    Respawned { new_count: u32 },
}

#[async_trait]
pub trait SessionHost: Send + Sync {
    async fn is_alive(&self, session_name: &str) -> Result<bool, SessionHostError>;

    /// Create a session; fails with `AlreadyAlive` if one by this name is
    /// already running.
    async fn spawn(
        &self,
        session_name: &str,
        working_dir: &Path,
        initial_input: Option<&str>,
    ) -> Result<(), SessionHostError>;

    async fn send(&self, session_name: &str, keystrokes: &str) -> Result<(), SessionHostError>;

    /// Recreate a dead session, bumping its respawn counter. Refuses once
    /// `respawn_count >= max_respawn`.
    async fn respawn(
        &self,
        session_name: &str,
        working_dir: &Path,
        initial_input: Option<&str>,
        respawn_count: u32,
        max_respawn: u32,
    ) -> Result<RespawnOutcome, SessionHostError>;
}

/// Reject reserved session-name prefixes before delegating to `inner`.
/// Wrapping a host this way keeps the reservation rule out of every
/// concrete adapter.
pub struct ReservedPrefixGuard<H> {
    inner: H,
    reserved_prefixes: Vec<String>,
}

impl<H> ReservedPrefixGuard<H> {
    pub fn new(inner: H, reserved_prefixes: Vec<String>) -> Self {
        Self { inner, reserved_prefixes }
    }

    fn check(&self, session_name: &str) -> Result<(), SessionHostError> {
        if self.reserved_prefixes.iter().any(|p| session_name.starts_with(p.as_str())) {
            return Err(SessionHostError::ReservedName(session_name.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl<H: SessionHost + Send + Sync> SessionHost for ReservedPrefixGuard<H> {
    async fn is_alive(&self, session_name: &str) -> Result<bool, SessionHostError> {
        self.inner.is_alive(session_name).await
    }

    async fn spawn(
        &self,
        session_name: &str,
        working_dir: &Path,
        initial_input: Option<&str>,
    ) -> Result<(), SessionHostError> {
        self.check(session_name)?;
        self.inner.spawn(session_name, working_dir, initial_input).await
    }

    async fn send(&self, session_name: &str, keystrokes: &str) -> Result<(), SessionHostError> {
        self.check(session_name)?;
        self.inner.send(session_name, keystrokes).await
    }

    async fn respawn(
        &self,
        session_name: &str,
        working_dir: &Path,
        initial_input: Option<&str>,
        respawn_count: u32,
        max_respawn: u32,
    ) -> Result<RespawnOutcome, SessionHostError> {
        self.check(session_name)?;
        self.inner.respawn(session_name, working_dir, initial_input, respawn_count, max_respawn).await
    }
}

/// `tmux`-backed session host: each named session is a detached tmux session.
#[derive(Clone, Copy, Debug, Default)]
pub struct TmuxSessionHost;

impl TmuxSessionHost {
    pub fn new() -> Self {
        Self
    }

    async fn has_session(&self, session_name: &str) -> Result<bool, SessionHostError> {
        let status = tokio::process::Command::new("tmux")
            .args(["has-session", "-t", session_name])
            .status()
            .await?;
        Ok(status.success())
    }
}

#[async_trait]
impl SessionHost for TmuxSessionHost {
    async fn is_alive(&self, session_name: &str) -> Result<bool, SessionHostError> {
        self.has_session(session_name).await
    }

    async fn spawn(
        &self,
        session_name: &str,
        working_dir: &Path,
        initial_input: Option<&str>,
    ) -> Result<(), SessionHostError> {
        if self.has_session(session_name).await? {
            return Err(SessionHostError::AlreadyAlive(session_name.to_string()));
        }
        let status = tokio::process::Command::new("tmux")
            .args(["new-session", "-d", "-s", session_name, "-c"])
            .arg(working_dir)
            .status()
            .await?;
        if !status.success() {
            return Err(SessionHostError::Io(std::io::Error::other(format!("tmux new-session exited with {status}"))));
        }
        if let Some(input) = initial_input {
            self.send(session_name, input).await?;
        }
        Ok(())
    }

    async fn send(&self, session_name: &str, keystrokes: &str) -> Result<(), SessionHostError> {
        let status = tokio::process::Command::new("tmux")
            .args(["send-keys", "-t", session_name, keystrokes, "Enter"])
            .status()
            .await?;
        if !status.success() {
            return Err(SessionHostError::NotFound(session_name.to_string()));
        }
        Ok(())
    }

    async fn respawn(
        &self,
        session_name: &str,
        working_dir: &Path,
        initial_input: Option<&str>,
        respawn_count: u32,
        max_respawn: u32,
    ) -> Result<RespawnOutcome, SessionHostError> {
        if self.has_session(session_name).await? {
            return Ok(RespawnOutcome::AlreadyAlive);
        }
        if respawn_count >= max_respawn {
            return Err(SessionHostError::RespawnCapReached {
                name: session_name.to_string(),
                attempted: respawn_count,
                max: max_respawn,
            });
        }
        self.spawn(session_name, working_dir, initial_input).await?;
        Ok(RespawnOutcome::Respawned { new_count: respawn_count + 1 })
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Debug, Clone, Default)]
    struct FakeSession {
        alive: bool,
        sent: Vec<String>,
    }

    /// In-memory session host for tests: sessions are alive once spawned,
    /// dead once `kill` is called, with full call recording.
    #[derive(Clone, Default)]
    pub struct FakeSessionHost {
        sessions: Arc<Mutex<HashMap<String, FakeSession>>>,
    }

    impl FakeSessionHost {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn kill(&self, session_name: &str) {
            if let Some(session) = self.sessions.lock().get_mut(session_name) {
                session.alive = false;
            }
        }

        pub fn sent_to(&self, session_name: &str) -> Vec<String> {
            self.sessions.lock().get(session_name).map(|s| s.sent.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl SessionHost for FakeSessionHost {
        async fn is_alive(&self, session_name: &str) -> Result<bool, SessionHostError> {
            Ok(self.sessions.lock().get(session_name).map(|s| s.alive).unwrap_or(false))
        }

        async fn spawn(
            &self,
            session_name: &str,
            _working_dir: &Path,
            initial_input: Option<&str>,
        ) -> Result<(), SessionHostError> {
            let mut sessions = self.sessions.lock();
            if sessions.get(session_name).map(|s| s.alive).unwrap_or(false) {
                return Err(SessionHostError::AlreadyAlive(session_name.to_string()));
            }
            let mut session = FakeSession { alive: true, sent: Vec::new() };
            if let Some(input) = initial_input {
                session.sent.push(input.to_string());
            }
            sessions.insert(session_name.to_string(), session);
            Ok(())
        }

        async fn send(&self, session_name: &str, keystrokes: &str) -> Result<(), SessionHostError> {
            let mut sessions = self.sessions.lock();
            let session = sessions.get_mut(session_name).ok_or_else(|| SessionHostError::NotFound(session_name.to_string()))?;
            session.sent.push(keystrokes.to_string());
            Ok(())
        }

        async fn respawn(
            &self,
            session_name: &str,
            working_dir: &Path,
            initial_input: Option<&str>,
            respawn_count: u32,
            max_respawn: u32,
        ) -> Result<RespawnOutcome, SessionHostError> {
            if self.is_alive(session_name).await? {
                return Ok(RespawnOutcome::AlreadyAlive);
            }
            if respawn_count >= max_respawn {
                return Err(SessionHostError::RespawnCapReached {
                    name: session_name.to_string(),
                    attempted: respawn_count,
                    max: max_respawn,
                });
            }
            self.sessions.lock().remove(session_name);
            self.spawn(session_name, working_dir, initial_input).await?;
            Ok(RespawnOutcome::Respawned { new_count: respawn_count + 1 })
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeSessionHost;
