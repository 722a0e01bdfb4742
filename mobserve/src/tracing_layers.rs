//! Tracing-based middleware for agent runs and tool invocations.

use std::sync::Arc;
use std::time::Instant;

use magent::{AgentHandler, AgentLayer, agent_handler};
use mcommon::layer;
use mtooling::{FunctionHandler, FunctionLayer, function_handler};

/// Logs run start, completion (with usage), and failure with elapsed time.
pub fn tracing_agent_layer() -> AgentLayer {
    layer(|next: AgentHandler| {
        agent_handler(move |request| {
            let next = Arc::clone(&next);
            async move {
                let start = Instant::now();
                tracing::info!(
                    phase = "agent",
                    event = "run_start",
                    message_count = request.messages.len(),
                    "agent run started"
                );

                match next(request).await {
                    Ok(response) => {
                        tracing::info!(
                            phase = "agent",
                            event = "run_success",
                            elapsed_ms = start.elapsed().as_millis() as u64,
                            response_messages = response.messages.len(),
                            input_tokens = response.usage.input_tokens,
                            output_tokens = response.usage.output_tokens,
                            "agent run completed"
                        );
                        Ok(response)
                    }
                    Err(error) => {
                        tracing::error!(
                            phase = "agent",
                            event = "run_failure",
                            elapsed_ms = start.elapsed().as_millis() as u64,
                            error_kind = ?error.kind,
                            error = %error,
                            "agent run failed"
                        );
                        Err(error)
                    }
                }
            }
        })
    })
}

/// Logs every tool invocation with the tool name, outcome, and elapsed time.
pub fn tracing_function_layer() -> FunctionLayer {
    layer(|next: FunctionHandler| {
        function_handler(move |invocation| {
            let next = Arc::clone(&next);
            async move {
                let tool_name = invocation.tool.name();
                let start = Instant::now();
                tracing::info!(
                    phase = "tool",
                    event = "invoke_start",
                    tool_name = %tool_name,
                    "tool invocation started"
                );

                match next(invocation).await {
                    Ok(result) => {
                        tracing::info!(
                            phase = "tool",
                            event = "invoke_success",
                            tool_name = %tool_name,
                            elapsed_ms = start.elapsed().as_millis() as u64,
                            "tool invocation completed"
                        );
                        Ok(result)
                    }
                    Err(error) => {
                        tracing::error!(
                            phase = "tool",
                            event = "invoke_failure",
                            tool_name = %tool_name,
                            elapsed_ms = start.elapsed().as_millis() as u64,
                            error_kind = ?error.kind,
                            error = %error,
                            "tool invocation failed"
                        );
                        Err(error)
                    }
                }
            }
        })
    })
}
