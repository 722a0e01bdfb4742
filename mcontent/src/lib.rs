//! Content and message data model with the `$type` JSON wire envelope.

mod content;
mod message;
mod usage;

pub use content::Content;
pub use message::{FinishReason, Message, Role, prepend_instructions};
pub use usage::UsageDetails;
