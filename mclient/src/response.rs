//! Complete responses, streaming updates, and the update-merge algorithm.
//!
//! ```rust
//! use mclient::{ChatResponse, ChatResponseUpdate};
//! use mcontent::{Content, Role};
//!
//! let updates = vec![
//!     ChatResponseUpdate::default()
//!         .with_role(Role::Assistant)
//!         .with_content(Content::text("Hello, ")),
//!     ChatResponseUpdate::default().with_content(Content::text("world!")),
//! ];
//!
//! let response = ChatResponse::from_updates(&updates);
//! assert_eq!(response.text(), "Hello, world!");
//! ```

use mcontent::{Content, FinishReason, Message, Role, UsageDetails};
use serde_json::Value;

/// One complete (non-streaming) turn from a chat backend.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatResponse {
    pub messages: Vec<Message>,
    pub response_id: Option<String>,
    pub conversation_id: Option<String>,
    pub model_id: Option<String>,
    pub created_at: Option<String>,
    pub finish_reason: Option<FinishReason>,
    pub usage: UsageDetails,
    /// The unparsed backend payload, when the transport keeps it.
    pub raw: Option<Value>,
}

impl ChatResponse {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    pub fn with_response_id(mut self, response_id: impl Into<String>) -> Self {
        self.response_id = Some(response_id.into());
        self
    }

    pub fn with_conversation_id(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn with_finish_reason(mut self, finish_reason: FinishReason) -> Self {
        self.finish_reason = Some(finish_reason);
        self
    }

    pub fn with_usage(mut self, usage: UsageDetails) -> Self {
        self.usage = usage;
        self
    }

    /// Concatenated text of all messages in the response.
    pub fn text(&self) -> String {
        self.messages.iter().map(Message::text).collect()
    }

    /// Reduces an ordered update sequence into one complete response.
    ///
    /// Content concatenates in arrival order; the last non-empty value wins
    /// for response id, conversation id, model id, and finish reason; the
    /// last update with a non-zero usage total is authoritative; adjacent
    /// plain-text runs collapse into single items. The synthesized message
    /// takes its role from the first update that sets one (assistant by
    /// default). Applying this to a single already-complete response is a
    /// no-op, and the reduction is associative over splits.
    pub fn from_updates(updates: &[ChatResponseUpdate]) -> Self {
        let mut response = Self::default();
        let mut contents = Vec::new();

        for update in updates {
            contents.extend(update.contents.iter().cloned());
            if update.response_id.is_some() {
                response.response_id = update.response_id.clone();
            }
            if update.conversation_id.is_some() {
                response.conversation_id = update.conversation_id.clone();
            }
            if update.model_id.is_some() {
                response.model_id = update.model_id.clone();
            }
            if update.finish_reason.is_some() {
                response.finish_reason = update.finish_reason;
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

/// One incremental slice of a streaming response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatResponseUpdate {
    pub contents: Vec<Content>,
    pub role: Option<Role>,
    pub response_id: Option<String>,
    pub conversation_id: Option<String>,
    pub model_id: Option<String>,
    pub finish_reason: Option<FinishReason>,
    pub usage: UsageDetails,
    pub raw: Option<Value>,
}

impl ChatResponseUpdate {
    pub fn with_content(mut self, content: Content) -> Self {
        self.contents.push(content);
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_content(Content::text(text))
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_response_id(mut self, response_id: impl Into<String>) -> Self {
        self.response_id = Some(response_id.into());
        self
    }

    pub fn with_conversation_id(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn with_finish_reason(mut self, finish_reason: FinishReason) -> Self {
        self.finish_reason = Some(finish_reason);
        self
    }

    pub fn with_usage(mut self, usage: UsageDetails) -> Self {
        self.usage = usage;
        self
    }

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

/// Collapses runs of adjacent plain-text items into single items. Non-text
/// items flush the accumulator and pass through untouched.
pub fn merge_text_runs(contents: Vec<Content>) -> Vec<Content> {
    let mut merged = Vec::new();
    let mut buffer = String::new();

    for content in contents {
        match content {
            Content::Text { text } => buffer.push_str(&text),
            other => {
                if !buffer.is_empty() {
                    merged.push(Content::text(std::mem::take(&mut buffer)));
                }
                merged.push(other);
            }
        }
    }
    if !buffer.is_empty() {
        merged.push(Content::text(buffer));
    }
    merged
}
