//! Chat backend contract and the chat middleware pipeline.

use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::sync::Arc;

use mcommon::{BoxFuture, CancellationToken, Layer};
use mcontent::Message;

use crate::{ChatOptions, ChatResponse, ChatResponseUpdate, ClientError, ResponseStream};

pub type ClientFuture<'a, T> = BoxFuture<'a, T>;

/// One backend call travelling through the chat pipeline.
#[derive(Clone)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub options: ChatOptions,
    pub cancellation: CancellationToken,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>, options: ChatOptions) -> Self {
        Self {
            messages,
            options,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }
}

impl Debug for ChatRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatRequest")
            .field("messages", &self.messages)
            .field("options", &self.options)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish()
    }
}

/// Interface to an LLM backend. Transport crates implement this; the agent
/// core never shapes wire requests itself.
pub trait ChatClient: Send + Sync {
    /// Sends messages and returns one complete response.
    fn respond<'a>(
        &'a self,
        request: ChatRequest,
    ) -> ClientFuture<'a, Result<ChatResponse, ClientError>>;

    /// Sends messages and returns a stream of incremental updates.
    fn stream_respond<'a>(
        &'a self,
        request: ChatRequest,
    ) -> ClientFuture<'a, Result<ResponseStream<ChatResponseUpdate>, ClientError>>;
}

pub type ChatHandler =
    Arc<dyn Fn(ChatRequest) -> ClientFuture<'static, Result<ChatResponse, ClientError>> + Send + Sync>;

pub type ChatLayer = Layer<ChatHandler>;

pub fn chat_handler<F, Fut>(handler: F) -> ChatHandler
where
    F: Fn(ChatRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ChatResponse, ClientError>> + Send + 'static,
{
    Arc::new(move |request| Box::pin(handler(request)))
}

/// The core chat handler: delegates straight to [`ChatClient::respond`].
/// Chat layers compose around this for every backend call.
pub fn client_chat_handler(client: Arc<dyn ChatClient>) -> ChatHandler {
    chat_handler(move |request| {
        let client = Arc::clone(&client);
        async move { client.respond(request).await }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use mcommon::{compose, layer};

    use super::*;
    use crate::ScriptedChatClient;

    fn recording_layer(name: &'static str, trace: Arc<Mutex<Vec<String>>>) -> ChatLayer {
        layer(move |next: ChatHandler| {
            let trace = Arc::clone(&trace);
            chat_handler(move |request| {
                let next = Arc::clone(&next);
                let trace = Arc::clone(&trace);
                async move {
                    trace.lock().expect("trace lock").push(format!("{name}:pre"));
                    let result = next(request).await;
                    trace.lock().expect("trace lock").push(format!("{name}:post"));
                    result
                }
            })
        })
    }

    #[tokio::test]
    async fn chat_layers_nest_around_the_client_call() {
        let client = Arc::new(ScriptedChatClient::with_responses(vec![ChatResponse::new(
            vec![Message::assistant("hi")],
        )]));
        let trace = Arc::new(Mutex::new(Vec::new()));

        let handler = compose(
            client_chat_handler(client.clone()),
            &[
                recording_layer("outer", Arc::clone(&trace)),
                recording_layer("inner", Arc::clone(&trace)),
            ],
        );

        let response = handler(ChatRequest::new(
            vec![Message::user("hello")],
            ChatOptions::default(),
        ))
        .await
        .expect("call should succeed");

        assert_eq!(response.text(), "hi");
        assert_eq!(client.request_count(), 1);
        assert_eq!(
            *trace.lock().expect("trace lock"),
            vec!["outer:pre", "inner:pre", "inner:post", "outer:post"]
        );
    }

    #[tokio::test]
    async fn a_chat_layer_may_rewrite_the_request() {
        let client = Arc::new(ScriptedChatClient::with_responses(vec![
            ChatResponse::new(vec![Message::assistant("ok")]),
        ]));
        let stamp = layer(|next: ChatHandler| {
            chat_handler(move |mut request: ChatRequest| {
                let next = Arc::clone(&next);
                let options = std::mem::take(&mut request.options);
                request.options = options.with_metadata("trace_id", "abc");
                async move { next(request).await }
            })
        });

        let handler = compose(client_chat_handler(client.clone()), &[stamp]);
        handler(ChatRequest::new(vec![Message::user("x")], ChatOptions::default()))
            .await
            .expect("call should succeed");

        let recorded = client.recorded_requests();
        assert_eq!(
            recorded[0].options.metadata.get("trace_id").map(String::as_str),
            Some("abc")
        );
    }
}
