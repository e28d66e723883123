//! Scripted model provider for tests and offline runs

use crate::{
    CompletionRequest, CompletionResponse, Message, ModelError, ModelProvider, Result, StopReason,
    TokenUsage,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

/// A canned answer
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedReply {
    /// Free text (may itself contain JSON)
    Text(String),
    /// A JSON document
    Json(Value),
    /// A single tool call
    ToolCall { name: String, input: Value },
    /// Fail with `ModelError::RateLimited`
    RateLimited,
    /// Fail with `ModelError::Unavailable`
    Unavailable,
}

#[derive(Default)]
struct Script {
    queued: HashMap<String, VecDeque<ScriptedReply>>,
    standing: HashMap<String, ScriptedReply>,
    calls: Vec<CompletionRequest>,
}

/// Provider that answers from a script keyed by request purpose
///
/// For each call the provider looks up the request's purpose and pops the
/// next queued reply, then falls back to the standing reply for that
/// purpose, then to the catch-all reply. With nothing scripted the call
/// fails as unavailable.
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<Script>,
    fallback: Option<ScriptedReply>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a one-shot reply for a purpose
    pub fn reply(self, purpose: impl Into<String>, reply: ScriptedReply) -> Self {
        self.lock()
            .queued
            .entry(purpose.into())
            .or_default()
            .push_back(reply);
        self
    }

    /// Queue a one-shot JSON reply for a purpose
    pub fn reply_json(self, purpose: impl Into<String>, value: Value) -> Self {
        self.reply(purpose, ScriptedReply::Json(value))
    }

    /// Reply used for a purpose once its queue is empty
    pub fn always(self, purpose: impl Into<String>, reply: ScriptedReply) -> Self {
        self.lock().standing.insert(purpose.into(), reply);
        self
    }

    /// Reply for any purpose without a script
    pub fn otherwise(mut self, reply: ScriptedReply) -> Self {
        self.fallback = Some(reply);
        self
    }

    pub fn otherwise_text(self, text: impl Into<String>) -> Self {
        self.otherwise(ScriptedReply::Text(text.into()))
    }

    /// Number of calls made with a purpose
    pub fn calls(&self, purpose: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|r| r.purpose() == purpose)
            .count()
    }

    /// Number of calls made overall
    pub fn total_calls(&self) -> usize {
        self.lock().calls.len()
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_reply(&self, request: &CompletionRequest) -> Option<ScriptedReply> {
        let mut script = self.lock();
        script.calls.push(request.clone());
        let purpose = request.purpose().to_string();
        if let Some(reply) = script.queued.get_mut(&purpose).and_then(VecDeque::pop_front) {
            return Some(reply);
        }
        script
            .standing
            .get(&purpose)
            .cloned()
            .or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let reply = self.next_reply(&request).ok_or_else(|| {
            ModelError::Unavailable(format!("no scripted reply for '{}'", request.purpose()))
        })?;

        let (message, stop_reason) = match reply {
            ScriptedReply::Text(text) => (Message::assistant(text), StopReason::EndTurn),
            ScriptedReply::Json(value) => {
                (Message::assistant(value.to_string()), StopReason::EndTurn)
            }
            ScriptedReply::ToolCall { name, input } => (
                Message::tool_call(format!("call_{name}"), name, input),
                StopReason::ToolUse,
            ),
            ScriptedReply::RateLimited => {
                return Err(ModelError::RateLimited("scripted rate limit".to_string()));
            }
            ScriptedReply::Unavailable => {
                return Err(ModelError::Unavailable("scripted outage".to_string()));
            }
        };

        Ok(CompletionResponse {
            message,
            stop_reason,
            usage: TokenUsage::default(),
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
