use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use magent::{Agent, AgentErrorKind, InvocationConfig, RunOptions};
use mclient::{ChatResponse, ScriptedChatClient};
use mcontent::{Content, FinishReason, Message, Role};
use mtooling::{FunctionTool, Tool, ToolDefinition, ToolError};
use serde_json::{Value, json};

fn call_response(name: &str, call_id: &str, arguments: &str) -> ChatResponse {
    ChatResponse::new(vec![Message::new(
        Role::Assistant,
        vec![Content::FunctionCall {
            call_id: call_id.to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }],
    )])
    .with_finish_reason(FinishReason::ToolCalls)
}

fn text_response(text: &str) -> ChatResponse {
    ChatResponse::new(vec![Message::assistant(text)]).with_finish_reason(FinishReason::Stop)
}

fn object_schema() -> Value {
    json!({"type": "object"})
}

fn add_tool() -> Arc<dyn Tool> {
    Arc::new(FunctionTool::new(
        ToolDefinition::new(
            "add",
            "Adds two integers",
            json!({
                "type": "object",
                "properties": {
                    "a": {"type": "integer"},
                    "b": {"type": "integer"}
                },
                "required": ["a", "b"]
            }),
        ),
        |args, _cancel| async move {
            let parsed: Value = serde_json::from_str(&args)
                .map_err(|error| ToolError::invalid_arguments(error.to_string()))?;
            let a = parsed["a"]
                .as_i64()
                .ok_or_else(|| ToolError::invalid_arguments("a must be an integer"))?;
            let b = parsed["b"]
                .as_i64()
                .ok_or_else(|| ToolError::invalid_arguments("b must be an integer"))?;
            Ok(json!(a + b))
        },
    ))
}

fn failing_tool(name: &str) -> Arc<dyn Tool> {
    let name_owned = name.to_string();
    Arc::new(FunctionTool::new(
        ToolDefinition::new(name, "Always fails", object_schema()),
        move |_args, _cancel| {
            let name = name_owned.clone();
            async move { Err(ToolError::execution("tool exploded").with_tool_name(name)) }
        },
    ))
}

fn has_pending_function_calls(messages: &[Message]) -> bool {
    messages
        .iter()
        .flat_map(|message| message.contents.iter())
        .any(Content::is_function_call)
}

#[tokio::test]
async fn answer_flows_back_after_one_tool_round_trip() {
    let client = Arc::new(ScriptedChatClient::with_responses(vec![
        call_response("add", "call_1", r#"{"a":3,"b":4}"#),
        text_response("The answer is 7."),
    ]));
    let agent = Agent::builder(client.clone()).tool(add_tool()).build();

    let response = agent
        .run(vec![Message::user("What is 3+4?")], RunOptions::new())
        .await
        .expect("run should succeed");

    assert_eq!(response.text(), "The answer is 7.");
    assert_eq!(client.request_count(), 2);
    assert!(!has_pending_function_calls(&response.messages));

    // The second backend call carried the tool result for the first call.
    let requests = client.recorded_requests();
    let last = requests[1].messages.last().expect("tool result message");
    assert_eq!(last.role, Role::Tool);
    assert_eq!(
        last.contents[0],
        Content::FunctionResult {
            call_id: "call_1".to_string(),
            result: json!(7),
        }
    );
}

#[tokio::test]
async fn loop_terminates_once_the_backend_stops_requesting_tools() {
    const ROUNDS: usize = 5;
    let client = Arc::new(ScriptedChatClient::new());
    for round in 0..ROUNDS {
        client.push_response(call_response("add", &format!("call_{round}"), r#"{"a":1,"b":1}"#));
    }
    client.push_response(text_response("all done"));

    let agent = Agent::builder(client.clone()).tool(add_tool()).build();
    let response = agent
        .run(vec![Message::user("keep adding")], RunOptions::new())
        .await
        .expect("run should succeed");

    assert_eq!(response.text(), "all done");
    assert_eq!(client.request_count(), ROUNDS + 1);
    assert!(!has_pending_function_calls(&response.messages));
}

#[tokio::test]
async fn breaker_trips_exactly_at_the_consecutive_error_threshold() {
    let client = Arc::new(ScriptedChatClient::new());
    for round in 0..5 {
        client.push_response(call_response("boom", &format!("call_{round}"), "{}"));
    }

    let agent = Agent::builder(client.clone())
        .tool(failing_tool("boom"))
        .invocation_config(InvocationConfig::default().with_max_consecutive_errors(3))
        .build();

    let error = agent
        .run(vec![Message::user("go")], RunOptions::new())
        .await
        .expect_err("run should fail fatally");

    assert_eq!(error.kind, AgentErrorKind::ToolExecution);
    assert_eq!(error.tool_name.as_deref(), Some("boom"));
    assert!(error.message.contains('3'));
    // Two failures are absorbed as tool-result messages; the third is fatal.
    assert_eq!(client.request_count(), 3);
}

#[tokio::test]
async fn a_success_resets_the_consecutive_error_counter() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempts);
    let flaky: Arc<dyn Tool> = Arc::new(FunctionTool::new(
        ToolDefinition::new("flaky", "Fails twice then succeeds", object_schema()),
        move |_args, _cancel| {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(ToolError::execution("transient"))
                } else {
                    Ok(json!("recovered"))
                }
            }
        },
    ));

    let client = Arc::new(ScriptedChatClient::new());
    for round in 0..3 {
        client.push_response(call_response("flaky", &format!("call_{round}"), "{}"));
    }
    client.push_response(text_response("made it"));

    let agent = Agent::builder(client.clone())
        .tool(flaky)
        .invocation_config(InvocationConfig::default().with_max_consecutive_errors(3))
        .build();

    let response = agent
        .run(vec![Message::user("go")], RunOptions::new())
        .await
        .expect("the reset should keep the run alive");

    assert_eq!(response.text(), "made it");
    assert_eq!(client.request_count(), 4);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn unknown_tool_degrades_to_an_error_result_by_default() {
    let client = Arc::new(ScriptedChatClient::with_responses(vec![
        call_response("missing", "call_1", "{}"),
        text_response("recovered"),
    ]));
    let agent = Agent::builder(client.clone()).tool(add_tool()).build();

    let response = agent
        .run(vec![Message::user("go")], RunOptions::new())
        .await
        .expect("run should degrade softly");

    assert_eq!(response.text(), "recovered");
    assert_eq!(client.request_count(), 2);

    let requests = client.recorded_requests();
    let last = requests[1].messages.last().expect("synthetic tool result");
    assert_eq!(last.role, Role::Tool);
    assert_eq!(
        last.contents[0],
        Content::FunctionResult {
            call_id: "call_1".to_string(),
            result: json!("error: unknown tool"),
        }
    );
}

#[tokio::test]
async fn an_unbroken_run_of_unknown_tools_trips_the_breaker() {
    let client = Arc::new(ScriptedChatClient::new());
    client.push_response(ChatResponse::new(vec![Message::new(
        Role::Assistant,
        vec![
            Content::FunctionCall {
                call_id: "call_1".to_string(),
                name: "ghost".to_string(),
                arguments: "{}".to_string(),
            },
            Content::FunctionCall {
                call_id: "call_2".to_string(),
                name: "phantom".to_string(),
                arguments: "{}".to_string(),
            },
        ],
    )]));

    let agent = Agent::builder(client.clone())
        .tool(add_tool())
        .invocation_config(InvocationConfig::default().with_max_consecutive_errors(2))
        .build();

    let error = agent
        .run(vec![Message::user("go")], RunOptions::new())
        .await
        .expect_err("unknown calls alone should trip the breaker");

    assert_eq!(error.kind, AgentErrorKind::ToolExecution);
    assert_eq!(error.tool_name.as_deref(), Some("phantom"));
    assert_eq!(client.request_count(), 1);
}

#[tokio::test]
async fn terminate_on_unknown_fails_the_run_immediately() {
    let client = Arc::new(ScriptedChatClient::with_responses(vec![call_response(
        "missing", "call_1", "{}",
    )]));
    let agent = Agent::builder(client.clone())
        .tool(add_tool())
        .invocation_config(InvocationConfig::default().with_terminate_on_unknown(true))
        .build();

    let error = agent
        .run(vec![Message::user("go")], RunOptions::new())
        .await
        .expect_err("unknown tool should be fatal");

    assert_eq!(error.kind, AgentErrorKind::ToolExecution);
    assert_eq!(error.tool_name.as_deref(), Some("missing"));
    assert!(error.message.contains("missing"));
    assert_eq!(client.request_count(), 1);
}

#[tokio::test]
async fn approval_required_tools_hand_the_turn_back_to_the_caller() {
    let invoked = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&invoked);
    let gated: Arc<dyn Tool> = Arc::new(
        FunctionTool::new(
            ToolDefinition::new("deploy", "Deploys to production", object_schema()),
            move |_args, _cancel| {
                flag.store(true, Ordering::SeqCst);
                async move { Ok(json!("deployed")) }
            },
        )
        .with_approval_required(),
    );

    let client = Arc::new(ScriptedChatClient::with_responses(vec![call_response(
        "deploy",
        "call_9",
        r#"{"target":"prod"}"#,
    )]));
    let agent = Agent::builder(client.clone()).tool(gated).build();

    let response = agent
        .run(vec![Message::user("ship it")], RunOptions::new())
        .await
        .expect("approval gate should return the turn, not fail it");

    assert_eq!(client.request_count(), 1);
    assert!(!invoked.load(Ordering::SeqCst));

    let requests = response.approval_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0],
        &Content::ApprovalRequest {
            call_id: "call_9".to_string(),
            name: "deploy".to_string(),
            arguments: r#"{"target":"prod"}"#.to_string(),
        }
    );
    // The original function call stays in the response for resumption.
    assert!(has_pending_function_calls(&response.messages));
}

#[tokio::test]
async fn declaration_only_tools_return_the_response_untouched() {
    let client = Arc::new(ScriptedChatClient::with_responses(vec![call_response(
        "handoff", "call_3", "{}",
    )]));
    let declared: Arc<dyn Tool> = Arc::new(FunctionTool::declaration(ToolDefinition::new(
        "handoff",
        "Executed by the caller out of band",
        object_schema(),
    )));
    let agent = Agent::builder(client.clone()).tool(declared).build();

    let response = agent
        .run(vec![Message::user("go")], RunOptions::new())
        .await
        .expect("declaration-only calls are handed back");

    assert_eq!(client.request_count(), 1);
    assert!(has_pending_function_calls(&response.messages));
    assert!(response.approval_requests().is_empty());
}

#[tokio::test]
async fn exhausting_the_iteration_budget_is_fatal() {
    let client = Arc::new(ScriptedChatClient::new());
    client.push_response(call_response("add", "call_1", r#"{"a":1,"b":1}"#));
    client.push_response(call_response("add", "call_2", r#"{"a":2,"b":2}"#));

    let agent = Agent::builder(client.clone())
        .tool(add_tool())
        .invocation_config(InvocationConfig::default().with_max_iterations(2))
        .build();

    let error = agent
        .run(vec![Message::user("go")], RunOptions::new())
        .await
        .expect_err("budget exhaustion should be fatal");

    assert_eq!(error.kind, AgentErrorKind::Execution);
    assert!(error.message.contains('2'));
    assert_eq!(client.request_count(), 2);
}

#[tokio::test]
async fn detailed_errors_forward_the_raw_failure_text_to_the_model() {
    let client = Arc::new(ScriptedChatClient::with_responses(vec![
        call_response("boom", "call_1", "{}"),
        text_response("noted"),
    ]));
    let agent = Agent::builder(client.clone())
        .tool(failing_tool("boom"))
        .invocation_config(InvocationConfig::default().with_include_detailed_errors(true))
        .build();

    agent
        .run(vec![Message::user("go")], RunOptions::new())
        .await
        .expect("one failure is absorbed");

    let requests = client.recorded_requests();
    let last = requests[1].messages.last().expect("tool result message");
    let Content::FunctionResult { result, .. } = &last.contents[0] else {
        panic!("expected a function result, got {:?}", last.contents[0]);
    };
    assert!(
        result
            .as_str()
            .expect("error text should be a string")
            .contains("tool exploded")
    );
}

#[tokio::test]
async fn generic_error_text_is_used_unless_details_are_enabled() {
    let client = Arc::new(ScriptedChatClient::with_responses(vec![
        call_response("boom", "call_1", "{}"),
        text_response("noted"),
    ]));
    let agent = Agent::builder(client.clone())
        .tool(failing_tool("boom"))
        .build();

    agent
        .run(vec![Message::user("go")], RunOptions::new())
        .await
        .expect("one failure is absorbed");

    let requests = client.recorded_requests();
    let last = requests[1].messages.last().expect("tool result message");
    assert_eq!(
        last.contents[0],
        Content::FunctionResult {
            call_id: "call_1".to_string(),
            result: json!("error invoking tool"),
        }
    );
}
