//! Tool trait contract and the closure-backed [`FunctionTool`].
//!
//! ```rust
//! use mtooling::{FunctionTool, Tool, ToolDefinition};
//! use serde_json::json;
//!
//! let tool = FunctionTool::new(
//!     ToolDefinition::new("echo", "Echoes input", json!({"type": "string"})),
//!     |args, _cancel| async move { Ok(serde_json::Value::String(args)) },
//! );
//!
//! assert_eq!(tool.name(), "echo");
//! assert!(!tool.declaration_only());
//! ```

use std::future::Future;
use std::sync::Arc;

use mcommon::{BoxFuture, CancellationToken};
use serde_json::Value;

use crate::ToolError;

pub type ToolFuture<'a, T> = BoxFuture<'a, T>;

/// Whether a tool requires human sign-off before it may be invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApprovalMode {
    #[default]
    Never,
    Always,
}

/// Name, description, and JSON-Schema parameters exposed to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A named, schema-described callable exposed to the model.
///
/// Identity is the name: within one request's tool set the later
/// registration wins on collision. Tools are constructed once and reused
/// across runs; the invocation loop treats them as stateless.
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    fn name(&self) -> String {
        self.definition().name
    }

    /// Invokes the tool with JSON-encoded arguments. Implementations must
    /// observe `cancellation` across any internal await points.
    fn invoke<'a>(
        &'a self,
        args_json: &'a str,
        cancellation: &'a CancellationToken,
    ) -> ToolFuture<'a, Result<Value, ToolError>>;

    /// Declaration-only tools are surfaced to the model but never
    /// auto-invoked; the caller handles their calls out of band.
    fn declaration_only(&self) -> bool {
        false
    }

    fn approval_mode(&self) -> ApprovalMode {
        ApprovalMode::Never
    }
}

type Handler = dyn Fn(String, CancellationToken) -> ToolFuture<'static, Result<Value, ToolError>>
    + Send
    + Sync;

/// A [`Tool`] backed by an async closure.
pub struct FunctionTool {
    definition: ToolDefinition,
    handler: Option<Arc<Handler>>,
    declaration_only: bool,
    approval_mode: ApprovalMode,
}

impl FunctionTool {
    pub fn new<F, Fut>(definition: ToolDefinition, handler: F) -> Self
    where
        F: Fn(String, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        let handler: Arc<Handler> =
            Arc::new(move |args_json, cancellation| Box::pin(handler(args_json, cancellation)));

        Self {
            definition,
            handler: Some(handler),
            declaration_only: false,
            approval_mode: ApprovalMode::Never,
        }
    }

    /// A declaration-only tool: advertised to the model, never invoked here.
    pub fn declaration(definition: ToolDefinition) -> Self {
        Self {
            definition,
            handler: None,
            declaration_only: true,
            approval_mode: ApprovalMode::Never,
        }
    }

    pub fn with_approval_required(mut self) -> Self {
        self.approval_mode = ApprovalMode::Always;
        self
    }

    pub fn with_declaration_only(mut self) -> Self {
        self.declaration_only = true;
        self
    }
}

impl Tool for FunctionTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    fn invoke<'a>(
        &'a self,
        args_json: &'a str,
        cancellation: &'a CancellationToken,
    ) -> ToolFuture<'a, Result<Value, ToolError>> {
        let Some(handler) = &self.handler else {
            return Box::pin(async move {
                Err(ToolError::declaration_only(
                    "tool is declaration-only and cannot be invoked",
                )
                .with_tool_name(self.definition.name.clone()))
            });
        };

        handler(args_json.to_string(), cancellation.clone())
    }

    fn declaration_only(&self) -> bool {
        self.declaration_only
    }

    fn approval_mode(&self) -> ApprovalMode {
        self.approval_mode
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ToolErrorKind;

    fn echo_definition() -> ToolDefinition {
        ToolDefinition::new("echo", "Echoes arguments", json!({"type": "string"}))
    }

    #[tokio::test]
    async fn function_tool_invokes_its_handler() {
        let tool = FunctionTool::new(echo_definition(), |args, _cancel| async move {
            Ok(Value::String(args))
        });

        let result = tool
            .invoke("payload", &CancellationToken::new())
            .await
            .expect("invocation should succeed");
        assert_eq!(result, json!("payload"));
    }

    #[tokio::test]
    async fn declaration_tool_refuses_invocation() {
        let tool = FunctionTool::declaration(echo_definition());
        assert!(tool.declaration_only());

        let error = tool
            .invoke("{}", &CancellationToken::new())
            .await
            .expect_err("invocation should fail");
        assert_eq!(error.kind, ToolErrorKind::DeclarationOnly);
        assert_eq!(error.tool_name.as_deref(), Some("echo"));
    }

    #[test]
    fn builder_toggles_set_approval_and_declaration_flags() {
        let tool = FunctionTool::new(echo_definition(), |_, _| async { Ok(Value::Null) })
            .with_approval_required()
            .with_declaration_only();

        assert_eq!(tool.approval_mode(), ApprovalMode::Always);
        assert!(tool.declaration_only());
    }
}
