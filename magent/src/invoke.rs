//! The function invocation loop.
//!
//! Given a response containing function-call content, resolve each call
//! against the request's tool set, invoke matched tools through the
//! function pipeline, append results, and re-query the backend until the
//! model produces a final answer or a limit trips. The loop is strictly
//! sequential: one backend call at a time, tool calls processed in
//! document order, tool-result order matching call order.

use std::sync::Arc;

use mclient::{ChatHandler, ChatOptions, ChatRequest, ChatResponse};
use mcommon::CancellationToken;
use mcontent::{Content, Message, Role};
use mtooling::{ApprovalMode, FunctionLayer, ToolRegistry, invoke_through_layers};
use serde_json::Value;

use crate::AgentError;

const DEFAULT_MAX_ITERATIONS: u32 = 40;
const DEFAULT_MAX_CONSECUTIVE_ERRORS: u32 = 3;

/// Bounds for the invocation loop. Zero values fall back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationConfig {
    /// Maximum backend round-trips per run. Default 40.
    pub max_iterations: u32,
    /// Consecutive tool failures tolerated before the loop fails fatally.
    /// Default 3.
    pub max_consecutive_errors: u32,
    /// Fail the run immediately when the model calls an unregistered tool.
    pub terminate_on_unknown: bool,
    /// Send raw tool error text back to the model instead of a generic
    /// placeholder.
    pub include_detailed_errors: bool,
}

impl Default for InvocationConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_consecutive_errors: DEFAULT_MAX_CONSECUTIVE_ERRORS,
            terminate_on_unknown: false,
            include_detailed_errors: false,
        }
    }
}

impl InvocationConfig {
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_max_consecutive_errors(mut self, max_consecutive_errors: u32) -> Self {
        self.max_consecutive_errors = max_consecutive_errors;
        self
    }

    pub fn with_terminate_on_unknown(mut self, terminate_on_unknown: bool) -> Self {
        self.terminate_on_unknown = terminate_on_unknown;
        self
    }

    pub fn with_include_detailed_errors(mut self, include_detailed_errors: bool) -> Self {
        self.include_detailed_errors = include_detailed_errors;
        self
    }

    fn normalized(self) -> Self {
        Self {
            max_iterations: if self.max_iterations == 0 {
                DEFAULT_MAX_ITERATIONS
            } else {
                self.max_iterations
            },
            max_consecutive_errors: if self.max_consecutive_errors == 0 {
                DEFAULT_MAX_CONSECUTIVE_ERRORS
            } else {
                self.max_consecutive_errors
            },
            ..self
        }
    }
}

struct PendingCall {
    call_id: String,
    name: String,
    arguments: String,
}

/// Runs the tool-calling loop against the composed chat handler.
///
/// Returns the final response plus the full turn transcript (every
/// assistant response and tool-result message, in generation order) for
/// session persistence.
pub(crate) async fn invoke_tools(
    chat: &ChatHandler,
    mut messages: Vec<Message>,
    options: &ChatOptions,
    config: InvocationConfig,
    function_layers: &[FunctionLayer],
    cancellation: &CancellationToken,
) -> Result<(ChatResponse, Vec<Message>), AgentError> {
    let config = config.normalized();
    // One registry per loop call; a later tool under a duplicate name wins.
    let registry = ToolRegistry::from_tools(options.tools.iter().cloned());
    let mut consecutive_errors: u32 = 0;
    let mut turn_messages = Vec::new();

    for _ in 0..config.max_iterations {
        if cancellation.is_cancelled() {
            return Err(AgentError::cancelled("agent run cancelled"));
        }

        let request = ChatRequest::new(messages.clone(), options.clone())
            .with_cancellation(cancellation.clone());
        let mut response = chat(request).await.map_err(AgentError::from)?;

        let calls = extract_function_calls(&response);
        if calls.is_empty() {
            turn_messages.extend(response.messages.iter().cloned());
            return Ok((response, turn_messages));
        }

        let mut result_messages = Vec::new();
        for call in calls {
            let Some(tool) = registry.get(&call.name) else {
                if config.terminate_on_unknown {
                    return Err(AgentError::tool_execution(format!(
                        "unknown tool '{}'",
                        call.name
                    ))
                    .with_tool_name(call.name));
                }
                tracing::warn!(tool = %call.name, "model requested an unregistered tool");
                consecutive_errors += 1;
                if consecutive_errors >= config.max_consecutive_errors {
                    return Err(consecutive_failure(consecutive_errors, &call.name));
                }
                result_messages.push(Message::tool(
                    call.call_id,
                    Value::String("error: unknown tool".to_string()),
                ));
                continue;
            };

            if tool.approval_mode() == ApprovalMode::Always {
                // Hand the turn back to the caller with an approval request;
                // resuming after approval is outside the loop's contract.
                response.messages.push(Message::new(
                    Role::Assistant,
                    vec![Content::ApprovalRequest {
                        call_id: call.call_id,
                        name: call.name,
                        arguments: call.arguments,
                    }],
                ));
                turn_messages.extend(response.messages.iter().cloned());
                return Ok((response, turn_messages));
            }

            if tool.declaration_only() {
                // The caller executes declaration-only tools out of band;
                // the function-call content stays in the response untouched.
                turn_messages.extend(response.messages.iter().cloned());
                return Ok((response, turn_messages));
            }

            let invocation = invoke_through_layers(
                Arc::clone(&tool),
                call.arguments.clone(),
                cancellation.clone(),
                function_layers,
            )
            .await;

            match invocation {
                Ok(result) => {
                    consecutive_errors = 0;
                    result_messages.push(Message::tool(call.call_id, result));
                }
                Err(error) => {
                    consecutive_errors += 1;
                    tracing::warn!(
                        tool = %call.name,
                        consecutive_errors,
                        error = %error,
                        "tool invocation failed"
                    );
                    if consecutive_errors >= config.max_consecutive_errors {
                        return Err(consecutive_failure(consecutive_errors, &call.name));
                    }
                    let text = if config.include_detailed_errors {
                        error.to_string()
                    } else {
                        "error invoking tool".to_string()
                    };
                    result_messages.push(Message::tool(call.call_id, Value::String(text)));
                }
            }
        }

        turn_messages.extend(response.messages.iter().cloned());
        turn_messages.extend(result_messages.iter().cloned());
        messages.extend(response.messages);
        messages.extend(result_messages);
    }

    Err(AgentError::execution(format!(
        "tool loop exhausted its iteration budget ({})",
        config.max_iterations
    )))
}

fn consecutive_failure(count: u32, tool_name: &str) -> AgentError {
    AgentError::tool_execution(format!("{count} consecutive tool failures"))
        .with_tool_name(tool_name)
}

/// Function-call content items across all response messages, in document
/// order.
fn extract_function_calls(response: &ChatResponse) -> Vec<PendingCall> {
    let mut calls = Vec::new();
    for message in &response.messages {
        for content in &message.contents {
            if let Content::FunctionCall {
                call_id,
                name,
                arguments,
            } = content
            {
                calls.push(PendingCall {
                    call_id: call_id.clone(),
                    name: name.clone(),
                    arguments: arguments.clone(),
                });
            }
        }
    }
    calls
}
