//! Tool invocation errors and classifications.

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolErrorKind {
    /// No tool with the requested name is registered.
    NotFound,
    /// The JSON arguments could not be parsed or failed validation.
    InvalidArguments,
    /// The tool ran and failed.
    Execution,
    /// The tool is declaration-only and carries no handler.
    DeclarationOnly,
    /// The invocation was cancelled before completion.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub message: String,
    pub tool_name: Option<String>,
    pub call_id: Option<String>,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            tool_name: None,
            call_id: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::NotFound, message)
    }

    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidArguments, message)
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Execution, message)
    }

    pub fn declaration_only(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::DeclarationOnly, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Cancelled, message)
    }

    pub fn with_tool_name(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }

    pub fn with_call_id(mut self, call_id: impl Into<String>) -> Self {
        self.call_id = Some(call_id.into());
        self
    }
}

impl Display for ToolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (&self.tool_name, &self.call_id) {
            (Some(tool_name), Some(call_id)) => write!(
                f,
                "{:?} [tool={}, call_id={}]: {}",
                self.kind, tool_name, call_id, self.message
            ),
            (Some(tool_name), None) => {
                write!(f, "{:?} [tool={}]: {}", self.kind, tool_name, self.message)
            }
            _ => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for ToolError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_tool_and_call_context() {
        let error = ToolError::execution("exploded")
            .with_tool_name("lookup")
            .with_call_id("call_1");

        let rendered = error.to_string();
        assert!(rendered.contains("lookup"));
        assert!(rendered.contains("call_1"));
        assert!(rendered.contains("exploded"));
    }

    #[test]
    fn helper_constructors_assign_kinds() {
        assert_eq!(ToolError::not_found("x").kind, ToolErrorKind::NotFound);
        assert_eq!(
            ToolError::invalid_arguments("x").kind,
            ToolErrorKind::InvalidArguments
        );
        assert_eq!(ToolError::cancelled("x").kind, ToolErrorKind::Cancelled);
    }
}
