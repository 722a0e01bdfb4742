//! Context providers inject dynamic context into each agent invocation.

use std::sync::Arc;

use mcontent::Message;
use mtooling::Tool;

use crate::{AgentError, AgentFuture};

/// Dynamic context returned by [`ContextProvider::invoking`]: instructions
/// are appended to the system prompt, messages are prepended to the
/// conversation, and tools are added to the available set.
#[derive(Clone, Default)]
pub struct ProvidedContext {
    pub instructions: Option<String>,
    pub messages: Vec<Message>,
    pub tools: Vec<Arc<dyn Tool>>,
}

impl ProvidedContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_tools(mut self, tools: Vec<Arc<dyn Tool>>) -> Self {
        self.tools = tools;
        self
    }
}

/// Supplies per-run context (RAG retrieval, memory lookup, dynamic tools)
/// around agent invocations. All hooks default to no-ops so implementations
/// override only what they need.
pub trait ContextProvider: Send + Sync {
    /// Called before each run with the prepared conversation.
    fn invoking<'a>(
        &'a self,
        _messages: &'a [Message],
    ) -> AgentFuture<'a, Result<ProvidedContext, AgentError>> {
        Box::pin(async { Ok(ProvidedContext::default()) })
    }

    /// Called after each run with the request and response messages.
    fn invoked<'a>(
        &'a self,
        _request: &'a [Message],
        _response: &'a [Message],
    ) -> AgentFuture<'a, Result<(), AgentError>> {
        Box::pin(async { Ok(()) })
    }

    /// Called when a new session is created.
    fn session_created<'a>(
        &'a self,
        _session_id: &'a str,
    ) -> AgentFuture<'a, Result<(), AgentError>> {
        Box::pin(async { Ok(()) })
    }
}

/// A [`ContextProvider`] that injects nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopContextProvider;

impl ContextProvider for NoopContextProvider {}
