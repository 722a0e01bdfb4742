//! Multi-turn conversation state with mutually exclusive management modes.
//!
//! A session starts in neither mode. The first response carrying a backend
//! conversation id locks it into service-managed mode; the first explicit
//! store attachment locks it into locally-managed mode. Once locked, the
//! opposite mode is rejected forever; re-locking the same mode succeeds
//! (service backends rotate conversation ids between turns).
//!
//! ```rust
//! use std::sync::Arc;
//! use magent::Session;
//! use mmemory::InMemoryMessageStore;
//!
//! let session = Session::new();
//! session
//!     .set_store(Arc::new(InMemoryMessageStore::new()))
//!     .expect("first attachment should lock local mode");
//! assert!(session.set_service_id("conv_1").is_err());
//! ```

use std::sync::{Arc, Mutex};

use mmemory::MessageStore;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{AgentError, ContextProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionMode {
    Service,
    Local,
}

#[derive(Default)]
struct SessionState {
    service_id: Option<String>,
    store: Option<Arc<dyn MessageStore>>,
    mode: Option<SessionMode>,
}

/// Conversation state for one multi-turn exchange. All mode transitions
/// happen under a single lock; everything else about interleaving
/// concurrent runs over one session is the caller's responsibility.
pub struct Session {
    id: String,
    context_provider: Option<Arc<dyn ContextProvider>>,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            context_provider: None,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn with_context_provider(mut self, context_provider: Arc<dyn ContextProvider>) -> Self {
        self.context_provider = Some(context_provider);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn context_provider(&self) -> Option<Arc<dyn ContextProvider>> {
        self.context_provider.clone()
    }

    /// The backend conversation id, when service-managed.
    pub fn service_id(&self) -> Option<String> {
        self.state().ok().and_then(|state| state.service_id.clone())
    }

    /// The local message store, when locally-managed.
    pub fn store(&self) -> Option<Arc<dyn MessageStore>> {
        self.state().ok().and_then(|state| state.store.clone())
    }

    pub fn is_service_managed(&self) -> bool {
        matches!(
            self.state().ok().and_then(|state| state.mode),
            Some(SessionMode::Service)
        )
    }

    pub fn is_locally_managed(&self) -> bool {
        matches!(
            self.state().ok().and_then(|state| state.mode),
            Some(SessionMode::Local)
        )
    }

    /// Locks the session into service-managed mode. Fails with the
    /// mode-locked kind when the session is already locally managed;
    /// repeated calls update the id.
    pub fn set_service_id(&self, service_id: impl Into<String>) -> Result<(), AgentError> {
        let mut state = self.state()?;
        if state.mode == Some(SessionMode::Local) {
            return Err(AgentError::mode_locked(
                "session is locally managed and cannot switch to service mode",
            ));
        }
        state.service_id = Some(service_id.into());
        state.mode = Some(SessionMode::Service);
        Ok(())
    }

    /// Locks the session into locally-managed mode. Fails with the
    /// mode-locked kind when the session is already service-managed;
    /// repeated calls replace the store.
    pub fn set_store(&self, store: Arc<dyn MessageStore>) -> Result<(), AgentError> {
        let mut state = self.state()?;
        if state.mode == Some(SessionMode::Service) {
            return Err(AgentError::mode_locked(
                "session is service managed and cannot switch to local mode",
            ));
        }
        state.store = Some(store);
        state.mode = Some(SessionMode::Local);
        Ok(())
    }

    /// The session state as a serializable JSON blob: the id, the service
    /// conversation id when service-managed, and the store's state when
    /// locally managed.
    pub async fn serialize(&self) -> Result<Value, AgentError> {
        let (service_id, store) = {
            let state = self.state()?;
            (state.service_id.clone(), state.store.clone())
        };

        let mut serialized = json!({ "id": self.id });
        if let Some(service_id) = service_id {
            serialized["serviceId"] = Value::String(service_id);
        }
        if let Some(store) = store {
            serialized["store"] = store.serialize().await?;
        }
        Ok(serialized)
    }

    fn state(&self) -> Result<std::sync::MutexGuard<'_, SessionState>, AgentError> {
        self.state
            .lock()
            .map_err(|_| AgentError::session("session state lock poisoned"))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
