//! Scripted in-memory [`ChatClient`] used by tests and examples.
//!
//! ```rust
//! use mclient::{ChatClient, ChatOptions, ChatRequest, ChatResponse, ScriptedChatClient};
//! use mcontent::Message;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let client = ScriptedChatClient::with_responses(vec![
//!     ChatResponse::new(vec![Message::assistant("scripted reply")]),
//! ]);
//!
//! let response = client
//!     .respond(ChatRequest::new(vec![Message::user("hi")], ChatOptions::default()))
//!     .await
//!     .expect("scripted response should be returned");
//! assert_eq!(response.text(), "scripted reply");
//! assert_eq!(client.request_count(), 1);
//! # });
//! ```

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::{
    ChatClient, ChatRequest, ChatResponse, ChatResponseUpdate, ClientError, ClientFuture,
    ResponseStream,
};

/// Replays queued responses (or update batches) in order and records every
/// request it sees. An exhausted script yields an invalid-response error,
/// which also catches tests making more backend calls than they expect.
#[derive(Default)]
pub struct ScriptedChatClient {
    responses: Mutex<VecDeque<Result<ChatResponse, ClientError>>>,
    update_batches: Mutex<VecDeque<Vec<ChatResponseUpdate>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(responses: Vec<ChatResponse>) -> Self {
        let client = Self::new();
        for response in responses {
            client.push_response(response);
        }
        client
    }

    pub fn push_response(&self, response: ChatResponse) {
        lock(&self.responses).push_back(Ok(response));
    }

    pub fn push_error(&self, error: ClientError) {
        lock(&self.responses).push_back(Err(error));
    }

    pub fn push_update_batch(&self, updates: Vec<ChatResponseUpdate>) {
        lock(&self.update_batches).push_back(updates);
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        lock(&self.requests).clone()
    }

    fn record(&self, request: &ChatRequest) {
        lock(&self.requests).push(request.clone());
    }
}

impl ChatClient for ScriptedChatClient {
    fn respond<'a>(
        &'a self,
        request: ChatRequest,
    ) -> ClientFuture<'a, Result<ChatResponse, ClientError>> {
        Box::pin(async move {
            if request.cancellation.is_cancelled() {
                return Err(ClientError::cancelled("request cancelled"));
            }
            self.record(&request);
            lock(&self.responses).pop_front().unwrap_or_else(|| {
                Err(ClientError::invalid_response("response script exhausted"))
            })
        })
    }

    fn stream_respond<'a>(
        &'a self,
        request: ChatRequest,
    ) -> ClientFuture<'a, Result<ResponseStream<ChatResponseUpdate>, ClientError>> {
        Box::pin(async move {
            if request.cancellation.is_cancelled() {
                return Err(ClientError::cancelled("request cancelled"));
            }
            self.record(&request);
            let batch = lock(&self.update_batches)
                .pop_front()
                .ok_or_else(|| ClientError::invalid_response("update script exhausted"))?;
            Ok(ResponseStream::from_items(batch))
        })
    }
}

/// Scripts outlive test panics; a poisoned lock just hands back its state.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
