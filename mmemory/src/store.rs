//! Message store contract and the in-memory implementation.
//!
//! ```rust
//! use mmemory::{InMemoryMessageStore, MessageStore};
//! use mcontent::Message;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let store = InMemoryMessageStore::new();
//! store
//!     .add_messages(vec![Message::user("hello")])
//!     .await
//!     .expect("append should work");
//! let messages = store.list_messages().await.expect("list should work");
//! assert_eq!(messages.len(), 1);
//! # });
//! ```

use std::sync::Mutex;

use mcommon::BoxFuture;
use mcontent::Message;
use serde_json::{Value, json};

use crate::MemoryError;

pub type MemoryFuture<'a, T> = BoxFuture<'a, T>;

/// Persists conversation messages for a locally-managed session. Append
/// order is the contract: `list_messages` returns exactly the order in
/// which messages were added.
pub trait MessageStore: Send + Sync {
    fn list_messages<'a>(&'a self) -> MemoryFuture<'a, Result<Vec<Message>, MemoryError>>;

    fn add_messages<'a>(
        &'a self,
        messages: Vec<Message>,
    ) -> MemoryFuture<'a, Result<(), MemoryError>>;

    /// The store's state as an opaque JSON blob for session serialization.
    fn serialize<'a>(&'a self) -> MemoryFuture<'a, Result<Value, MemoryError>>;
}

#[derive(Debug, Default)]
pub struct InMemoryMessageStore {
    messages: Mutex<Vec<Message>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, Vec<Message>>, MemoryError> {
        self.messages
            .lock()
            .map_err(|_| MemoryError::storage("in-memory store lock poisoned"))
    }
}

impl MessageStore for InMemoryMessageStore {
    fn list_messages<'a>(&'a self) -> MemoryFuture<'a, Result<Vec<Message>, MemoryError>> {
        Box::pin(async move { Ok(self.guard()?.clone()) })
    }

    fn add_messages<'a>(
        &'a self,
        messages: Vec<Message>,
    ) -> MemoryFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            self.guard()?.extend(messages);
            Ok(())
        })
    }

    fn serialize<'a>(&'a self) -> MemoryFuture<'a, Result<Value, MemoryError>> {
        Box::pin(async move {
            let messages = self.guard()?.clone();
            let encoded = serde_json::to_value(&messages).map_err(|error| {
                MemoryError::serialization(format!("failed to encode messages: {error}"))
            })?;
            Ok(json!({ "messages": encoded }))
        })
    }
}
