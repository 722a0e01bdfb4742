//! Closed content union and its `$type`-discriminated JSON envelope.
//!
//! ```rust
//! use mcontent::Content;
//!
//! let call = Content::FunctionCall {
//!     call_id: "call_1".to_string(),
//!     name: "add".to_string(),
//!     arguments: r#"{"a":3,"b":4}"#.to_string(),
//! };
//!
//! let encoded = serde_json::to_string(&call).expect("content should serialize");
//! assert!(encoded.contains(r#""$type":"functionCall""#));
//!
//! let decoded: Content = serde_json::from_str(&encoded).expect("content should deserialize");
//! assert_eq!(decoded, call);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::UsageDetails;

/// One typed unit of message payload.
///
/// The variant set is fixed: content consumers match exhaustively, and the
/// compiler rejects any switch site that misses a variant. Every variant
/// serializes as a JSON object carrying a `$type` string discriminator plus
/// its kind-specific fields; an unknown discriminator fails deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum Content {
    /// Plain text.
    #[serde(rename = "text")]
    Text { text: String },

    /// Chain-of-thought / reasoning text.
    #[serde(rename = "reasoning")]
    Reasoning {
        #[serde(default, skip_serializing_if = "String::is_empty")]
        text: String,
    },

    /// Binary data carried inline as a data URI.
    #[serde(rename = "data", rename_all = "camelCase")]
    Data {
        uri: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        media_type: Option<String>,
    },

    /// External URI reference.
    #[serde(rename = "uri", rename_all = "camelCase")]
    Uri {
        uri: String,
        media_type: String,
    },

    /// An error surfaced as message content.
    #[serde(rename = "error", rename_all = "camelCase")]
    Error {
        #[serde(default, skip_serializing_if = "String::is_empty")]
        message: String,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        error_code: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<Value>,
    },

    /// A tool call requested by the model. `arguments` is JSON-encoded text.
    #[serde(rename = "functionCall", rename_all = "camelCase")]
    FunctionCall {
        call_id: String,
        name: String,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        arguments: String,
    },

    /// The result of a tool call, correlated by `call_id`.
    #[serde(rename = "functionResult", rename_all = "camelCase")]
    FunctionResult {
        call_id: String,
        #[serde(default, skip_serializing_if = "Value::is_null")]
        result: Value,
    },

    /// Token usage reported inside a message.
    #[serde(rename = "usage")]
    Usage { usage: UsageDetails },

    /// Reference to a service-hosted file.
    #[serde(rename = "hostedFile", rename_all = "camelCase")]
    HostedFile { file_id: String },

    /// Reference to a service-hosted vector store.
    #[serde(rename = "hostedVectorStore", rename_all = "camelCase")]
    HostedVectorStore { vector_store_id: String },

    #[serde(rename = "codeInterpreterToolCall", rename_all = "camelCase")]
    CodeInterpreterCall {
        #[serde(default, skip_serializing_if = "String::is_empty")]
        call_id: String,
        code: String,
    },

    #[serde(rename = "codeInterpreterToolResult", rename_all = "camelCase")]
    CodeInterpreterResult {
        #[serde(default, skip_serializing_if = "String::is_empty")]
        call_id: String,
        output: String,
    },

    #[serde(rename = "imageGenerationToolCall", rename_all = "camelCase")]
    ImageGenerationCall {
        #[serde(default, skip_serializing_if = "String::is_empty")]
        call_id: String,
        prompt: String,
    },

    #[serde(rename = "imageGenerationToolResult", rename_all = "camelCase")]
    ImageGenerationResult {
        #[serde(default, skip_serializing_if = "String::is_empty")]
        call_id: String,
        uri: String,
    },

    #[serde(rename = "mcpServerToolCall", rename_all = "camelCase")]
    McpServerCall {
        #[serde(default, skip_serializing_if = "String::is_empty")]
        call_id: String,
        name: String,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        arguments: String,
    },

    #[serde(rename = "mcpServerToolResult", rename_all = "camelCase")]
    McpServerResult {
        #[serde(default, skip_serializing_if = "String::is_empty")]
        call_id: String,
        #[serde(default, skip_serializing_if = "Value::is_null")]
        result: Value,
    },

    /// A tool call held back pending human approval.
    #[serde(rename = "functionApprovalRequest", rename_all = "camelCase")]
    ApprovalRequest {
        call_id: String,
        name: String,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        arguments: String,
    },

    /// The caller's approval decision for a held tool call.
    #[serde(rename = "functionApprovalResponse", rename_all = "camelCase")]
    ApprovalResponse {
        call_id: String,
        approved: bool,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        reason: String,
    },
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// The wire discriminator for this item.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Reasoning { .. } => "reasoning",
            Self::Data { .. } => "data",
            Self::Uri { .. } => "uri",
            Self::Error { .. } => "error",
            Self::FunctionCall { .. } => "functionCall",
            Self::FunctionResult { .. } => "functionResult",
            Self::Usage { .. } => "usage",
            Self::HostedFile { .. } => "hostedFile",
            Self::HostedVectorStore { .. } => "hostedVectorStore",
            Self::CodeInterpreterCall { .. } => "codeInterpreterToolCall",
            Self::CodeInterpreterResult { .. } => "codeInterpreterToolResult",
            Self::ImageGenerationCall { .. } => "imageGenerationToolCall",
            Self::ImageGenerationResult { .. } => "imageGenerationToolResult",
            Self::McpServerCall { .. } => "mcpServerToolCall",
            Self::McpServerResult { .. } => "mcpServerToolResult",
            Self::ApprovalRequest { .. } => "functionApprovalRequest",
            Self::ApprovalResponse { .. } => "functionApprovalResponse",
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }

    pub fn is_function_call(&self) -> bool {
        matches!(self, Self::FunctionCall { .. })
    }

    pub fn is_approval_request(&self) -> bool {
        matches!(self, Self::ApprovalRequest { .. })
    }
}
