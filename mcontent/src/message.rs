//! Role-tagged messages and message-list helpers.
//!
//! ```rust
//! use mcontent::{Message, Role};
//!
//! let message = Message::user("What is 3+4?");
//! assert_eq!(message.role, Role::User);
//! assert_eq!(message.text(), "What is 3+4?");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Content;

/// Author of a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    Tool,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
}

/// One turn's contribution: a role plus an ordered list of content items.
///
/// A tool-role message conventionally carries exactly one function-result
/// content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<Content>,
    #[serde(
        rename = "authorName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub author_name: Option<String>,
    #[serde(rename = "messageId", default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

impl Message {
    pub fn new(role: Role, contents: Vec<Content>) -> Self {
        Self {
            role,
            contents,
            author_name: None,
            message_id: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Content::text(text)])
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![Content::text(text)])
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, vec![Content::text(text)])
    }

    /// A tool-role message carrying one function result for `call_id`.
    pub fn tool(call_id: impl Into<String>, result: Value) -> Self {
        Self::new(
            Role::Tool,
            vec![Content::FunctionResult {
                call_id: call_id.into(),
                result,
            }],
        )
    }

    pub fn with_author_name(mut self, author_name: impl Into<String>) -> Self {
        self.author_name = Some(author_name.into());
        self
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    /// Concatenated text of all plain-text content items.
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

/// Inserts a synthesized system message at the front iff `instructions` is
/// non-empty and no system message already exists.
pub fn prepend_instructions(messages: Vec<Message>, instructions: &str) -> Vec<Message> {
    if instructions.is_empty() || messages.iter().any(|m| m.role == Role::System) {
        return messages;
    }

    let mut with_system = Vec::with_capacity(messages.len() + 1);
    with_system.push(Message::system(instructions));
    with_system.extend(messages);
    with_system
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn text_concatenates_only_plain_text_items() {
        let message = Message::new(
            Role::Assistant,
            vec![
                Content::text("Hello, "),
                Content::Reasoning {
                    text: "hidden".to_string(),
                },
                Content::text("world!"),
            ],
        );
        assert_eq!(message.text(), "Hello, world!");
    }

    #[test]
    fn tool_message_carries_a_single_function_result() {
        let message = Message::tool("call_1", json!(7));
        assert_eq!(message.role, Role::Tool);
        assert_eq!(message.contents.len(), 1);
        assert_eq!(
            message.contents[0],
            Content::FunctionResult {
                call_id: "call_1".to_string(),
                result: json!(7),
            }
        );
    }

    #[test]
    fn prepend_instructions_inserts_a_leading_system_message() {
        let messages = prepend_instructions(vec![Message::user("hi")], "Be brief.");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].text(), "Be brief.");
    }

    #[test]
    fn prepend_instructions_respects_an_existing_system_message() {
        let original = vec![Message::system("already here"), Message::user("hi")];
        let messages = prepend_instructions(original.clone(), "Be brief.");
        assert_eq!(messages, original);
    }

    #[test]
    fn prepend_instructions_with_empty_instructions_is_a_no_op() {
        let original = vec![Message::user("hi")];
        assert_eq!(prepend_instructions(original.clone(), ""), original);
    }

    #[test]
    fn message_round_trips_with_optional_fields() {
        let message = Message::assistant("done")
            .with_author_name("planner")
            .with_message_id("msg_1");
        let encoded = serde_json::to_string(&message).expect("serialize should work");
        assert!(encoded.contains(r#""authorName":"planner""#));

        let decoded: Message = serde_json::from_str(&encoded).expect("deserialize should work");
        assert_eq!(decoded, message);
    }
}
