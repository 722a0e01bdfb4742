//! The agent: composes a chat client with tools, middleware, sessions, and
//! context providers behind `run` / `run_stream` entry points.
//!
//! ```rust
//! use std::sync::Arc;
//! use magent::Agent;
//! use mclient::ScriptedChatClient;
//!
//! let client = Arc::new(ScriptedChatClient::new());
//! let agent = Agent::builder(client)
//!     .name("assistant")
//!     .instructions("You are helpful.")
//!     .build();
//! assert_eq!(agent.name(), Some("assistant"));
//! ```

use std::sync::Arc;

use mclient::{
    ChatClient, ChatLayer, ChatOptions, ChatRequest, ChatResponse, client_chat_handler,
    merge_tools_by_name,
};
use mcommon::{CancellationToken, compose};
use mcontent::{Message, prepend_instructions};
use mmemory::{InMemoryMessageStore, MessageStore};
use mtooling::{FunctionLayer, Tool};

use crate::{
    AgentError, AgentHandler, AgentLayer, AgentRequest, AgentRunResponse, AgentRunStream,
    AgentRunUpdate, ContextProvider, InvocationConfig, Session, agent_handler,
    invoke::invoke_tools,
};

type StoreFactory = Arc<dyn Fn() -> Arc<dyn MessageStore> + Send + Sync>;

struct AgentCore {
    id: String,
    name: Option<String>,
    description: Option<String>,
    instructions: Option<String>,
    client: Arc<dyn ChatClient>,
    tools: Vec<Arc<dyn Tool>>,
    default_options: Option<ChatOptions>,
    store_factory: Option<StoreFactory>,
    context_provider: Option<Arc<dyn ContextProvider>>,
    agent_layers: Vec<AgentLayer>,
    chat_layers: Vec<ChatLayer>,
    function_layers: Vec<FunctionLayer>,
    invocation_config: InvocationConfig,
}

/// Builder for [`Agent`].
pub struct AgentBuilder {
    core: AgentCore,
}

impl AgentBuilder {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self {
            core: AgentCore {
                id: uuid::Uuid::new_v4().to_string(),
                name: None,
                description: None,
                instructions: None,
                client,
                tools: Vec::new(),
                default_options: None,
                store_factory: None,
                context_provider: None,
                agent_layers: Vec::new(),
                chat_layers: Vec::new(),
                function_layers: Vec::new(),
                invocation_config: InvocationConfig::default(),
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.core.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.core.description = Some(description.into());
        self
    }

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.core.instructions = Some(instructions.into());
        self
    }

    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.core.tools.push(tool);
        self
    }

    pub fn tools(mut self, tools: Vec<Arc<dyn Tool>>) -> Self {
        self.core.tools.extend(tools);
        self
    }

    pub fn default_options(mut self, options: ChatOptions) -> Self {
        self.core.default_options = Some(options);
        self
    }

    /// Factory for message stores backing sessions that lazily lock into
    /// local mode. Defaults to [`InMemoryMessageStore`].
    pub fn message_store_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn MessageStore> + Send + Sync + 'static,
    {
        self.core.store_factory = Some(Arc::new(factory));
        self
    }

    pub fn context_provider(mut self, context_provider: Arc<dyn ContextProvider>) -> Self {
        self.core.context_provider = Some(context_provider);
        self
    }

    pub fn agent_layer(mut self, layer: AgentLayer) -> Self {
        self.core.agent_layers.push(layer);
        self
    }

    pub fn chat_layer(mut self, layer: ChatLayer) -> Self {
        self.core.chat_layers.push(layer);
        self
    }

    pub fn function_layer(mut self, layer: FunctionLayer) -> Self {
        self.core.function_layers.push(layer);
        self
    }

    pub fn invocation_config(mut self, config: InvocationConfig) -> Self {
        self.core.invocation_config = config;
        self
    }

    pub fn build(self) -> Agent {
        Agent {
            core: Arc::new(self.core),
        }
    }
}

/// Per-call configuration for [`Agent::run`] and [`Agent::run_stream`].
#[derive(Clone, Default)]
pub struct RunOptions {
    pub session: Option<Arc<Session>>,
    pub tools: Vec<Arc<dyn Tool>>,
    pub options: Option<ChatOptions>,
    pub cancellation: CancellationToken,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(mut self, session: Arc<Session>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_tools(mut self, tools: Vec<Arc<dyn Tool>>) -> Self {
        self.tools.extend(tools);
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

/// A conversational agent over a pluggable chat backend.
#[derive(Clone)]
pub struct Agent {
    core: Arc<AgentCore>,
}

impl Agent {
    pub fn builder(client: Arc<dyn ChatClient>) -> AgentBuilder {
        AgentBuilder::new(client)
    }

    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self::builder(client).build()
    }

    pub fn id(&self) -> &str {
        &self.core.id
    }

    pub fn name(&self) -> Option<&str> {
        self.core.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.core.description.as_deref()
    }

    /// Runs the agent to completion and returns the merged response. The
    /// inner handler is wrapped in the agent middleware chain; any tool in
    /// the merged options routes the run through the invocation loop.
    pub async fn run(
        &self,
        messages: Vec<Message>,
        run_options: RunOptions,
    ) -> Result<AgentRunResponse, AgentError> {
        let agent = self.clone();
        let run_tools = run_options.tools.clone();
        let handler: AgentHandler = agent_handler(move |request: AgentRequest| {
            let agent = agent.clone();
            let run_tools = run_tools.clone();
            async move { agent.handle_run(request, run_tools).await }
        });
        let wrapped = compose(handler, &self.core.agent_layers);

        let mut request = AgentRequest::new(messages).with_cancellation(run_options.cancellation);
        request.session = run_options.session;
        request.options = run_options.options;
        wrapped(request).await
    }

    /// Streams one backend turn as agent updates. This thinner path maps
    /// backend updates directly: it runs neither the invocation loop nor
    /// the agent middleware chain.
    pub async fn run_stream(
        &self,
        messages: Vec<Message>,
        run_options: RunOptions,
    ) -> Result<AgentRunStream, AgentError> {
        let mut options =
            self.prepare_options(&run_options.tools, run_options.options.as_ref());
        let all_messages = self
            .prepare_messages(&messages, run_options.session.as_ref(), &mut options)
            .await?;

        let request = ChatRequest::new(all_messages, options)
            .with_cancellation(run_options.cancellation.clone());
        let stream = self
            .core
            .client
            .stream_respond(request)
            .await
            .map_err(AgentError::from)?;

        let agent_id = self.core.id.clone();
        let mapped = stream.map(move |update| AgentRunUpdate {
            contents: update.contents,
            role: update.role,
            agent_id: Some(agent_id.clone()),
            response_id: update.response_id,
            usage: update.usage,
            raw: update.raw,
        });
        Ok(AgentRunStream::new(mapped))
    }

    /// Creates a session pre-wired with this agent's context provider and
    /// fires its `session_created` hook. The session stays mode-less until
    /// the first run locks it.
    pub async fn new_session(&self) -> Session {
        let mut session = Session::new();
        if let Some(provider) = &self.core.context_provider {
            session = session.with_context_provider(Arc::clone(provider));
            if let Err(error) = provider.session_created(session.id()).await {
                tracing::warn!(error = %error, "context provider session_created hook failed");
            }
        }
        session
    }

    async fn handle_run(
        &self,
        request: AgentRequest,
        run_tools: Vec<Arc<dyn Tool>>,
    ) -> Result<AgentRunResponse, AgentError> {
        let mut options = self.prepare_options(&run_tools, request.options.as_ref());
        let all_messages = self
            .prepare_messages(&request.messages, request.session.as_ref(), &mut options)
            .await?;

        tracing::debug!(
            agent_id = %self.core.id,
            agent_name = self.core.name.as_deref().unwrap_or_default(),
            message_count = all_messages.len(),
            tool_count = options.tools.len(),
            "agent run"
        );

        let chat = compose(
            client_chat_handler(Arc::clone(&self.core.client)),
            &self.core.chat_layers,
        );

        let (chat_response, turn_messages) = if options.tools.is_empty() {
            let chat_request = ChatRequest::new(all_messages, options.clone())
                .with_cancellation(request.cancellation.clone());
            let response = chat(chat_request).await.map_err(AgentError::from)?;
            let turn_messages = response.messages.clone();
            (response, turn_messages)
        } else {
            invoke_tools(
                &chat,
                all_messages,
                &options,
                self.core.invocation_config,
                &self.core.function_layers,
                &request.cancellation,
            )
            .await?
        };

        if let Some(session) = &request.session
            && let Err(error) = self
                .update_session(session, &request.messages, &chat_response, turn_messages)
                .await
        {
            tracing::warn!(error = %error, "failed to update session after run");
        }

        if let Some(provider) = self.effective_context_provider(request.session.as_deref())
            && let Err(error) = provider
                .invoked(&request.messages, &chat_response.messages)
                .await
        {
            tracing::warn!(error = %error, "context provider invoked hook failed");
        }

        Ok(AgentRunResponse {
            messages: chat_response.messages,
            response_id: chat_response.response_id,
            agent_id: Some(self.core.id.clone()),
            usage: chat_response.usage,
            raw: chat_response.raw,
        })
    }

    /// Per-call options over agent defaults: scalars right-biased, tool
    /// lists concatenated and de-duplicated by name, agent instructions
    /// prepended ahead of per-call instructions.
    fn prepare_options(
        &self,
        run_tools: &[Arc<dyn Tool>],
        call_options: Option<&ChatOptions>,
    ) -> ChatOptions {
        let mut options = ChatOptions::merge(self.core.default_options.as_ref(), call_options);

        if !self.core.tools.is_empty() || !run_tools.is_empty() {
            let combined = merge_tools_by_name(&self.core.tools, run_tools);
            options.tools = merge_tools_by_name(&options.tools, &combined);
        }

        if let Some(instructions) = &self.core.instructions {
            options.instructions = Some(match options.instructions.take() {
                Some(existing) if !existing.is_empty() => format!("{instructions}\n{existing}"),
                _ => instructions.clone(),
            });
        }

        options
    }

    /// Assembles the full conversation: session history, then caller
    /// messages, then context-provider injections, then a synthesized
    /// system message when none exists.
    async fn prepare_messages(
        &self,
        messages: &[Message],
        session: Option<&Arc<Session>>,
        options: &mut ChatOptions,
    ) -> Result<Vec<Message>, AgentError> {
        let mut all_messages = Vec::new();

        if let Some(session) = session {
            if let Some(store) = session.store() {
                let history = store.list_messages().await.map_err(|error| {
                    AgentError::session(format!("failed to load session history: {error}"))
                })?;
                all_messages.extend(history);
            }
            if let Some(service_id) = session.service_id() {
                options.conversation_id = Some(service_id);
            }
        }

        all_messages.extend(messages.iter().cloned());

        if let Some(provider) = self.effective_context_provider(session.map(|s| s.as_ref())) {
            let provided = provider.invoking(&all_messages).await?;
            if let Some(instructions) = &provided.instructions {
                options.append_instructions(instructions);
            }
            if !provided.messages.is_empty() {
                let mut with_context = provided.messages;
                with_context.extend(all_messages);
                all_messages = with_context;
            }
            if !provided.tools.is_empty() {
                options.tools = merge_tools_by_name(&options.tools, &provided.tools);
            }
        }

        Ok(prepend_instructions(
            all_messages,
            options.instructions.as_deref().unwrap_or_default(),
        ))
    }

    /// The session's context provider wins over the agent's.
    fn effective_context_provider(
        &self,
        session: Option<&Session>,
    ) -> Option<Arc<dyn ContextProvider>> {
        session
            .and_then(Session::context_provider)
            .or_else(|| self.core.context_provider.clone())
    }

    /// Persists one turn: the caller's input followed by every message the
    /// turn generated, in generation order. A mode-less session locks
    /// lazily here: a backend conversation id locks service mode, otherwise
    /// a local store is created and attached.
    async fn update_session(
        &self,
        session: &Arc<Session>,
        request_messages: &[Message],
        response: &ChatResponse,
        turn_messages: Vec<Message>,
    ) -> Result<(), AgentError> {
        let store = match session.store() {
            Some(store) => store,
            None => {
                if let Some(conversation_id) = &response.conversation_id {
                    return session.set_service_id(conversation_id.clone());
                }
                let store: Arc<dyn MessageStore> = match &self.core.store_factory {
                    Some(factory) => factory(),
                    None => Arc::new(InMemoryMessageStore::new()),
                };
                session.set_store(Arc::clone(&store))?;
                store
            }
        };

        store
            .add_messages(request_messages.to_vec())
            .await
            .map_err(AgentError::from)?;
        store.add_messages(turn_messages).await.map_err(AgentError::from)
    }
}
