//! Tool contracts, registry, and the function invocation pipeline.

mod error;
mod pipeline;
mod registry;
mod tool;

pub use error::{ToolError, ToolErrorKind};
pub use pipeline::{
    FunctionHandler, FunctionInvocation, FunctionLayer, function_handler, invoke_through_layers,
};
pub use registry::ToolRegistry;
pub use tool::{ApprovalMode, FunctionTool, Tool, ToolDefinition, ToolFuture};
