//! Agent run pipeline: the middleware chain wrapped around `Agent::run`.

use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::sync::Arc;

use mclient::ChatOptions;
use mcommon::{BoxFuture, CancellationToken, Layer};
use mcontent::Message;

use crate::{AgentError, AgentRunResponse, Session};

pub type AgentFuture<'a, T> = BoxFuture<'a, T>;

/// Inputs for one agent run travelling through the agent pipeline. Layers
/// may rewrite the messages or options before the core handler runs, or
/// replace the response afterwards.
#[derive(Clone)]
pub struct AgentRequest {
    pub messages: Vec<Message>,
    pub session: Option<Arc<Session>>,
    pub options: Option<ChatOptions>,
    pub cancellation: CancellationToken,
}

impl AgentRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            session: None,
            options: None,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_session(mut self, session: Arc<Session>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }
}

impl Debug for AgentRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRequest")
            .field("messages", &self.messages)
            .field("session", &self.session.as_ref().map(|s| s.id().to_string()))
            .field("options", &self.options)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish()
    }
}

pub type AgentHandler = Arc<
    dyn Fn(AgentRequest) -> AgentFuture<'static, Result<AgentRunResponse, AgentError>>
        + Send
        + Sync,
>;

pub type AgentLayer = Layer<AgentHandler>;

pub fn agent_handler<F, Fut>(handler: F) -> AgentHandler
where
    F: Fn(AgentRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<AgentRunResponse, AgentError>> + Send + 'static,
{
    Arc::new(move |request| Box::pin(handler(request)))
}
