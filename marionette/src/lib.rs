//! Unified facade over the marionette workspace crates.
//!
//! This crate is designed to be the single dependency for most
//! applications: it re-exports the agent core, the chat client contract,
//! the content model, tooling, memory backends, and observability layers.
//!
//! ```rust
//! use std::sync::Arc;
//! use marionette::prelude::*;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let client = Arc::new(ScriptedChatClient::with_responses(vec![
//!     ChatResponse::new(vec![Message::assistant("Hello there.")]),
//! ]));
//!
//! let agent = Agent::builder(client)
//!     .name("assistant")
//!     .instructions("You are concise.")
//!     .build();
//!
//! let response = agent
//!     .run(vec![Message::user("Say hello.")], RunOptions::new())
//!     .await
//!     .expect("run should succeed");
//! assert_eq!(response.text(), "Hello there.");
//! # });
//! ```

pub mod prelude;

pub use magent;
pub use mclient;
pub use mcommon;
pub use mcontent;
pub use mmemory;
pub use mobserve;
pub use mtooling;

pub use magent::{
    Agent, AgentBuilder, AgentError, AgentErrorKind, AgentFuture, AgentHandler, AgentLayer,
    AgentRequest, AgentRunResponse, AgentRunStream, AgentRunUpdate, ContextProvider,
    InvocationConfig, NoopContextProvider, ProvidedContext, RunOptions, Session, agent_handler,
};
pub use mclient::{
    ChatClient, ChatHandler, ChatLayer, ChatOptions, ChatRequest, ChatResponse,
    ChatResponseUpdate, ClientError, ClientErrorKind, ClientFuture, ResponseStream,
    ScriptedChatClient, StreamProducer, ToolChoice, chat_handler, client_chat_handler,
    merge_text_runs, merge_tools_by_name,
};
pub use mcommon::{BoxFuture, CancellationToken, Layer, Registry, compose, layer};
pub use mcontent::{
    Content, FinishReason, Message, Role, UsageDetails, prepend_instructions,
};
pub use mmemory::{
    FileMessageStore, InMemoryMessageStore, MemoryError, MemoryErrorKind, MemoryFuture,
    MessageStore, SqliteMessageStore,
};
pub use mobserve::{metrics_agent_layer, tracing_agent_layer, tracing_function_layer};
pub use mtooling::{
    ApprovalMode, FunctionHandler, FunctionInvocation, FunctionLayer, FunctionTool, Tool,
    ToolDefinition, ToolError, ToolErrorKind, ToolFuture, ToolRegistry, function_handler,
    invoke_through_layers,
};
