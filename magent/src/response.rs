//! Agent run responses, streaming updates, and the run stream wrapper.

use mclient::{ResponseStream, merge_text_runs};
use mcommon::CancellationToken;
use mcontent::{Content, Message, Role, UsageDetails};
use serde_json::Value;

use crate::AgentError;

/// The complete result of one agent run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AgentRunResponse {
    pub messages: Vec<Message>,
    pub response_id: Option<String>,
    pub agent_id: Option<String>,
    pub usage: UsageDetails,
    pub raw: Option<Value>,
}

impl AgentRunResponse {
    /// Concatenated text of all messages in the response.
    pub fn text(&self) -> String {
        self.messages.iter().map(Message::text).collect()
    }

    /// Approval-request content items awaiting caller sign-off, across all
    /// messages.
    pub fn approval_requests(&self) -> Vec<&Content> {
        self.messages
            .iter()
            .flat_map(|message| message.contents.iter())
            .filter(|content| content.is_approval_request())
            .collect()
    }

    /// Reduces an ordered update sequence into one complete run response:
    /// content concatenates in arrival order, adjacent text runs collapse,
    /// the last non-empty identity fields win, and the last non-zero usage
    /// is authoritative.
    pub fn from_updates(updates: &[AgentRunUpdate]) -> Self {
        let mut response = Self::default();
        let mut contents = Vec::new();

        for update in updates {
            contents.extend(update.contents.iter().cloned());
            if update.agent_id.is_some() {
                response.agent_id = update.agent_id.clone();
            }
            if update.response_id.is_some() {
                response.response_id = update.response_id.clone();
            }
            if !update.usage.is_zero() {
                response.usage = update.usage;
            }
            if update.raw.is_some() {
                response.raw = update.raw.clone();
            }
        }

        let merged = merge_text_runs(contents);
        if !merged.is_empty() {
            let role = updates
                .iter()
                .find_map(|update| update.role)
                .unwrap_or(Role::Assistant);
            response.messages = vec![Message::new(role, merged)];
        }
        response
    }
}

/// One incremental chunk of a streaming agent run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AgentRunUpdate {
    pub contents: Vec<Content>,
    pub role: Option<Role>,
    pub agent_id: Option<String>,
    pub response_id: Option<String>,
    pub usage: UsageDetails,
    pub raw: Option<Value>,
}

impl AgentRunUpdate {
    /// Concatenated text of all plain-text items in this update.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for content in &self.contents {
            if let Content::Text { text } = content {
                out.push_str(text);
            }
        }
        out
    }
}

/// Pull iterator over an agent run's streaming updates, remembering every
/// update it has delivered so [`AgentRunStream::final_response`] can merge
/// the full sequence.
pub struct AgentRunStream {
    stream: ResponseStream<AgentRunUpdate>,
    seen: Vec<AgentRunUpdate>,
}

impl AgentRunStream {
    pub fn new(stream: ResponseStream<AgentRunUpdate>) -> Self {
        Self {
            stream,
            seen: Vec::new(),
        }
    }

    pub async fn next(
        &mut self,
        cancellation: &CancellationToken,
    ) -> Result<Option<AgentRunUpdate>, AgentError> {
        let update = self
            .stream
            .next(cancellation)
            .await
            .map_err(AgentError::from)?;
        if let Some(update) = &update {
            self.seen.push(update.clone());
        }
        Ok(update)
    }

    /// Drains any remaining updates and merges everything delivered so far
    /// into one [`AgentRunResponse`]. The stream is fully consumed after
    /// this returns.
    pub async fn final_response(
        &mut self,
        cancellation: &CancellationToken,
    ) -> Result<AgentRunResponse, AgentError> {
        while self.next(cancellation).await?.is_some() {}
        Ok(AgentRunResponse::from_updates(&self.seen))
    }

    /// Releases the underlying stream and its producer task.
    pub fn close(&mut self) {
        self.stream.close();
    }
}
