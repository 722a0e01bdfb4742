//! Function invocation pipeline: the middleware chain wrapped around every
//! tool invocation performed by the agent loop.
//!
//! ```rust
//! use mtooling::{FunctionHandler, function_handler};
//!
//! let handler: FunctionHandler = function_handler(|invocation| async move {
//!     invocation
//!         .tool
//!         .invoke(&invocation.arguments, &invocation.cancellation)
//!         .await
//! });
//! let _ = handler;
//! ```

use std::future::Future;
use std::sync::Arc;

use mcommon::{CancellationToken, Layer, compose};
use serde_json::Value;

use crate::{Tool, ToolError, ToolFuture};

/// One pending tool invocation travelling through the function pipeline.
#[derive(Clone)]
pub struct FunctionInvocation {
    pub tool: Arc<dyn Tool>,
    /// JSON-encoded arguments exactly as the model produced them.
    pub arguments: String,
    pub cancellation: CancellationToken,
}

impl FunctionInvocation {
    pub fn new(tool: Arc<dyn Tool>, arguments: impl Into<String>) -> Self {
        Self {
            tool,
            arguments: arguments.into(),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }
}

pub type FunctionHandler =
    Arc<dyn Fn(FunctionInvocation) -> ToolFuture<'static, Result<Value, ToolError>> + Send + Sync>;

pub type FunctionLayer = Layer<FunctionHandler>;

pub fn function_handler<F, Fut>(handler: F) -> FunctionHandler
where
    F: Fn(FunctionInvocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
{
    Arc::new(move |invocation| Box::pin(handler(invocation)))
}

/// Runs one tool invocation through the composed function pipeline. The
/// core handler delegates to [`Tool::invoke`].
pub async fn invoke_through_layers(
    tool: Arc<dyn Tool>,
    arguments: String,
    cancellation: CancellationToken,
    layers: &[FunctionLayer],
) -> Result<Value, ToolError> {
    let core = function_handler(|invocation: FunctionInvocation| async move {
        invocation
            .tool
            .invoke(&invocation.arguments, &invocation.cancellation)
            .await
    });

    let handler = compose(core, layers);
    handler(FunctionInvocation::new(tool, arguments).with_cancellation(cancellation)).await
}
