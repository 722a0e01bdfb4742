//! Observability middleware layers for agent runs and tool invocations.
//!
//! Logging and metrics are explicit layers handed to the agent builder,
//! never a global side channel: wire them where you want them.
//!
//! ```rust
//! use mobserve::{metrics_agent_layer, tracing_agent_layer, tracing_function_layer};
//!
//! let _agent_layers = vec![tracing_agent_layer(), metrics_agent_layer()];
//! let _function_layer = tracing_function_layer();
//! ```

mod metrics_layers;
mod tracing_layers;

pub use metrics_layers::metrics_agent_layer;
pub use tracing_layers::{tracing_agent_layer, tracing_function_layer};

pub mod prelude {
    pub use crate::{metrics_agent_layer, tracing_agent_layer, tracing_function_layer};
}
