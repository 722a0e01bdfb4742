//! Chat backend contract, option merging, response merging, and the
//! cancellable streaming primitive.

mod client;
mod error;
mod options;
mod response;
mod scripted;
mod stream;

pub use client::{
    ChatClient, ChatHandler, ChatLayer, ChatRequest, ClientFuture, chat_handler,
    client_chat_handler,
};
pub use error::{ClientError, ClientErrorKind};
pub use options::{ChatOptions, ToolChoice, merge_tools_by_name};
pub use response::{ChatResponse, ChatResponseUpdate, merge_text_runs};
pub use scripted::ScriptedChatClient;
pub use stream::{ResponseStream, StreamProducer};
