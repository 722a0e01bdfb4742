//! Agent orchestration: run entry points, the function invocation loop,
//! sessions, and context providers.

mod agent;
mod context;
mod error;
mod invoke;
mod pipeline;
mod response;
mod session;

pub use agent::{Agent, AgentBuilder, RunOptions};
pub use context::{ContextProvider, NoopContextProvider, ProvidedContext};
pub use error::{AgentError, AgentErrorKind};
pub use invoke::InvocationConfig;
pub use pipeline::{AgentFuture, AgentHandler, AgentLayer, AgentRequest, agent_handler};
pub use response::{AgentRunResponse, AgentRunStream, AgentRunUpdate};
pub use session::Session;
