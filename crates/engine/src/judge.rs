// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Completion Judge: a short-circuit "may this
//! session stop?" evaluator invoked at shutdown. Fail-open on any error — a
//! broken or absent judge must never block a worker that wants to stop.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct JudgeInput {
    /// The last K turns of the session's transcript, oldest-first.
    pub transcript_tail: Vec<String>,
    pub outstanding_work: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JudgeVerdict {
    pub should_continue: bool,
    pub reason: String,
    pub suggestion: Option<String>,
}

impl JudgeVerdict {
    fn fail_open(reason: impl Into<String>) -> Self {
        Self { should_continue: false, reason: reason.into(), suggestion: None }
    }
}

#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("transcript unavailable: {0}")]
    MissingTranscript(String),
    #[error("remote summariser error: {0}")]
    Remote(String),
    #[error("malformed summariser response: {0}")]
    Malformed(String),
}

/// The evaluator the completion judge delegates to — a pure function of its
/// inputs. Concrete summariser clients (an LLM call, an external service)
/// are out of scope; this is the seam they plug into.
#[async_trait]
pub trait Summariser: Send + Sync {
    async fn judge(&self, input: &JudgeInput) -> Result<JudgeVerdict, JudgeError>;
}

#[async_trait]
pub trait CompletionJudge: Send + Sync {
    async fn evaluate(&self, input: JudgeInput) -> JudgeVerdict;
}

/// The judge used when none is configured: always lets the session stop.
/// This is also the fail-open default every other judge degrades to on error.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopJudge;

#[async_trait]
impl CompletionJudge for NoopJudge {
    async fn evaluate(&self, _input: JudgeInput) -> JudgeVerdict {
        JudgeVerdict::fail_open("no completion judge configured")
    }
}

/// Delegates to a [`Summariser`]; any error from it collapses to
/// `should_continue=false` rather than propagating.
pub struct DelegatingJudge<S> {
    summariser: S,
}

impl<S: Summariser> DelegatingJudge<S> {
    pub fn new(summariser: S) -> Self {
        Self { summariser }
    }
}

#[async_trait]
impl<S: Summariser> CompletionJudge for DelegatingJudge<S> {
    async fn evaluate(&self, input: JudgeInput) -> JudgeVerdict {
        match self.summariser.judge(&input).await {
            Ok(verdict) => verdict,
            Err(e) => JudgeVerdict::fail_open(e.to_string()),
        }
    }
}
