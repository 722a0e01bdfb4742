//! Chat request options and the right-biased overlay merge.
//!
//! ```rust
//! use mclient::ChatOptions;
//!
//! let defaults = ChatOptions::default()
//!     .with_model_id("gpt-4o-mini")
//!     .with_instructions("You are helpful.");
//! let per_call = ChatOptions::default().with_temperature(0.2);
//!
//! let merged = ChatOptions::merge(Some(&defaults), Some(&per_call));
//! assert_eq!(merged.model_id.as_deref(), Some("gpt-4o-mini"));
//! assert_eq!(merged.temperature, Some(0.2));
//! ```

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use mtooling::Tool;
use serde_json::Value;

/// How the model selects tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolChoice {
    Auto,
    Required,
    None,
    /// Force the named function.
    Function(String),
}

/// Configuration for a single chat completion request. `None` means "use
/// the provider default"; merging overlays per-call values onto defaults.
#[derive(Clone, Default)]
pub struct ChatOptions {
    pub model_id: Option<String>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_tokens: Option<u32>,
    pub stop: Vec<String>,
    pub seed: Option<i64>,
    pub frequency_penalty: Option<f64>,
    pub presence_penalty: Option<f64>,
    pub tools: Vec<Arc<dyn Tool>>,
    pub tool_choice: Option<ToolChoice>,
    pub response_format: Option<Value>,
    pub metadata: HashMap<String, String>,
    pub user: Option<String>,
    pub instructions: Option<String>,
    pub conversation_id: Option<String>,
    pub store: Option<bool>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = stop;
        self
    }

    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_tools(mut self, tools: Vec<Arc<dyn Tool>>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        self.tool_choice = Some(tool_choice);
        self
    }

    pub fn with_response_format(mut self, response_format: Value) -> Self {
        self.response_format = Some(response_format);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_conversation_id(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn with_store(mut self, store: bool) -> Self {
        self.store = Some(store);
        self
    }

    /// Appends `extra` to the instructions with a newline separator.
    pub fn append_instructions(&mut self, extra: &str) {
        if extra.is_empty() {
            return;
        }
        self.instructions = Some(match self.instructions.take() {
            Some(existing) if !existing.is_empty() => format!("{existing}\n{extra}"),
            _ => extra.to_string(),
        });
    }

    /// Right-biased overlay merge: unset overlay fields keep base values,
    /// instructions concatenate with a newline, tool lists merge by name
    /// (overlay wins collisions, base order preserved, new tools appended),
    /// and metadata maps merge with overlay keys winning.
    pub fn merge(base: Option<&ChatOptions>, overlay: Option<&ChatOptions>) -> ChatOptions {
        let (base, overlay) = match (base, overlay) {
            (None, None) => return ChatOptions::default(),
            (None, Some(overlay)) => return overlay.clone(),
            (Some(base), None) => return base.clone(),
            (Some(base), Some(overlay)) => (base, overlay),
        };

        let mut merged = base.clone();

        if overlay.model_id.is_some() {
            merged.model_id = overlay.model_id.clone();
        }
        if overlay.temperature.is_some() {
            merged.temperature = overlay.temperature;
        }
        if overlay.top_p.is_some() {
            merged.top_p = overlay.top_p;
        }
        if overlay.max_tokens.is_some() {
            merged.max_tokens = overlay.max_tokens;
        }
        if !overlay.stop.is_empty() {
            merged.stop = overlay.stop.clone();
        }
        if overlay.seed.is_some() {
            merged.seed = overlay.seed;
        }
        if overlay.frequency_penalty.is_some() {
            merged.frequency_penalty = overlay.frequency_penalty;
        }
        if overlay.presence_penalty.is_some() {
            merged.presence_penalty = overlay.presence_penalty;
        }
        if overlay.tool_choice.is_some() {
            merged.tool_choice = overlay.tool_choice.clone();
        }
        if overlay.response_format.is_some() {
            merged.response_format = overlay.response_format.clone();
        }
        if overlay.user.is_some() {
            merged.user = overlay.user.clone();
        }
        if overlay.conversation_id.is_some() {
            merged.conversation_id = overlay.conversation_id.clone();
        }
        if overlay.store.is_some() {
            merged.store = overlay.store;
        }

        if let Some(extra) = &overlay.instructions {
            merged.append_instructions(extra);
        }

        if !overlay.tools.is_empty() {
            merged.tools = merge_tools_by_name(&merged.tools, &overlay.tools);
        }

        for (key, value) in &overlay.metadata {
            merged.metadata.insert(key.clone(), value.clone());
        }

        merged
    }
}

impl Debug for ChatOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let tool_names: Vec<String> = self.tools.iter().map(|tool| tool.name()).collect();
        f.debug_struct("ChatOptions")
            .field("model_id", &self.model_id)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("max_tokens", &self.max_tokens)
            .field("stop", &self.stop)
            .field("seed", &self.seed)
            .field("frequency_penalty", &self.frequency_penalty)
            .field("presence_penalty", &self.presence_penalty)
            .field("tools", &tool_names)
            .field("tool_choice", &self.tool_choice)
            .field("response_format", &self.response_format)
            .field("metadata", &self.metadata)
            .field("user", &self.user)
            .field("instructions", &self.instructions)
            .field("conversation_id", &self.conversation_id)
            .field("store", &self.store)
            .finish()
    }
}

/// Merges two tool lists by name: base order is preserved, an `extra` tool
/// sharing a name replaces the base entry in place, and remaining `extra`
/// tools are appended in their own order.
pub fn merge_tools_by_name(
    base: &[Arc<dyn Tool>],
    extra: &[Arc<dyn Tool>],
) -> Vec<Arc<dyn Tool>> {
    let mut merged: Vec<Arc<dyn Tool>> = base.to_vec();
    for tool in extra {
        let name = tool.name();
        match merged.iter_mut().find(|existing| existing.name() == name) {
            Some(slot) => *slot = Arc::clone(tool),
            None => merged.push(Arc::clone(tool)),
        }
    }
    merged
}
