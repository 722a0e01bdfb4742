//! Agent-layer errors and classifications.

use std::error::Error;
use std::fmt::{Display, Formatter};

use mclient::{ClientError, ClientErrorKind};
use mmemory::MemoryError;
use mtooling::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentErrorKind {
    /// The agent machinery failed while executing a run.
    Execution,
    /// The agent was configured or wired incorrectly.
    Initialization,
    /// A session operation failed.
    Session,
    /// An attempt to switch a session's mode after it was locked.
    SessionModeLocked,
    /// A tool-related failure outside the invocation itself.
    Tool,
    /// The invocation loop failed fatally while executing tools.
    ToolExecution,
    /// A middleware layer failed.
    Middleware,
    /// The run was cancelled by the caller.
    Cancelled,
}

/// A fatal agent failure. When the root cause is a backend rejection, the
/// underlying [`ClientError`] rides along so callers can branch on the
/// service kind, status, and code without string matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentError {
    pub kind: AgentErrorKind,
    pub message: String,
    pub tool_name: Option<String>,
    pub client: Option<ClientError>,
}

impl AgentError {
    pub fn new(kind: AgentErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            tool_name: None,
            client: None,
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(AgentErrorKind::Execution, message)
    }

    pub fn initialization(message: impl Into<String>) -> Self {
        Self::new(AgentErrorKind::Initialization, message)
    }

    pub fn session(message: impl Into<String>) -> Self {
        Self::new(AgentErrorKind::Session, message)
    }

    pub fn mode_locked(message: impl Into<String>) -> Self {
        Self::new(AgentErrorKind::SessionModeLocked, message)
    }

    pub fn tool(message: impl Into<String>) -> Self {
        Self::new(AgentErrorKind::Tool, message)
    }

    pub fn tool_execution(message: impl Into<String>) -> Self {
        Self::new(AgentErrorKind::ToolExecution, message)
    }

    pub fn middleware(message: impl Into<String>) -> Self {
        Self::new(AgentErrorKind::Middleware, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(AgentErrorKind::Cancelled, message)
    }

    pub fn with_tool_name(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == AgentErrorKind::Cancelled
    }

    /// The backend failure underneath an execution-kind error, if any.
    pub fn client_error(&self) -> Option<&ClientError> {
        self.client.as_ref()
    }
}

impl Display for AgentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.tool_name {
            Some(tool_name) => {
                write!(f, "{:?} [tool={}]: {}", self.kind, tool_name, self.message)
            }
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for AgentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.client
            .as_ref()
            .map(|client| client as &(dyn Error + 'static))
    }
}

impl From<ClientError> for AgentError {
    /// Backend failures surface at the agent boundary wrapped with the
    /// execution kind (cancellation keeps its own kind), with the original
    /// error preserved for programmatic inspection.
    fn from(client: ClientError) -> Self {
        let kind = if client.kind == ClientErrorKind::Cancelled {
            AgentErrorKind::Cancelled
        } else {
            AgentErrorKind::Execution
        };
        let mut error = Self::new(kind, client.message.clone());
        error.client = Some(client);
        error
    }
}

impl From<ToolError> for AgentError {
    fn from(tool: ToolError) -> Self {
        let mut error = Self::new(AgentErrorKind::ToolExecution, tool.message.clone());
        error.tool_name = tool.tool_name.clone();
        error
    }
}

impl From<MemoryError> for AgentError {
    fn from(memory: MemoryError) -> Self {
        Self::session(memory.to_string())
    }
}
