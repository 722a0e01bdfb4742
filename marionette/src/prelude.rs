//! Common imports for most marionette applications.

pub use crate::{
    Agent, AgentBuilder, AgentError, AgentErrorKind, AgentRunResponse, AgentRunStream,
    AgentRunUpdate, ApprovalMode, BoxFuture, CancellationToken, ChatClient, ChatOptions,
    ChatRequest, ChatResponse, ChatResponseUpdate, ClientError, ClientErrorKind, Content,
    ContextProvider, FileMessageStore, FinishReason, FunctionTool, InMemoryMessageStore,
    InvocationConfig, Message, MessageStore, NoopContextProvider, ProvidedContext, ResponseStream,
    Role, RunOptions, ScriptedChatClient, Session, SqliteMessageStore, Tool, ToolChoice,
    ToolDefinition, ToolError, ToolErrorKind, ToolRegistry, UsageDetails, metrics_agent_layer,
    tracing_agent_layer, tracing_function_layer,
};
