use std::sync::Arc;

use marionette::prelude::*;
use serde_json::json;

#[tokio::test]
async fn an_agent_built_through_the_facade_runs_the_full_tool_loop() {
    let client = Arc::new(ScriptedChatClient::with_responses(vec![
        ChatResponse::new(vec![Message::new(
            Role::Assistant,
            vec![Content::FunctionCall {
                call_id: "call_1".to_string(),
                name: "add".to_string(),
                arguments: r#"{"a":3,"b":4}"#.to_string(),
            }],
        )]),
        ChatResponse::new(vec![Message::assistant("The answer is 7.")]),
    ]));

    let add: Arc<dyn Tool> = Arc::new(FunctionTool::new(
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
            let parsed: serde_json::Value = serde_json::from_str(&args)
                .map_err(|error| ToolError::invalid_arguments(error.to_string()))?;
            Ok(json!(parsed["a"].as_i64().unwrap_or_default()
                + parsed["b"].as_i64().unwrap_or_default()))
        },
    ));

    let agent = Agent::builder(client.clone())
        .name("calculator")
        .instructions("Use the add tool for arithmetic.")
        .tool(add)
        .agent_layer(tracing_agent_layer())
        .function_layer(tracing_function_layer())
        .build();

    let session = Arc::new(agent.new_session().await);
    let response = agent
        .run(
            vec![Message::user("What is 3+4?")],
            RunOptions::new().with_session(Arc::clone(&session)),
        )
        .await
        .expect("run should succeed");

    assert_eq!(response.text(), "The answer is 7.");
    assert_eq!(client.request_count(), 2);
    assert!(session.is_locally_managed());

    let store = session.store().expect("store should be attached");
    let transcript = store.list_messages().await.expect("transcript should load");
    assert_eq!(transcript.first().map(|m| m.role), Some(Role::User));
    assert_eq!(transcript.last().map(|m| m.text()), Some("The answer is 7.".to_string()));
}

#[tokio::test]
async fn streaming_through_the_facade_merges_to_the_same_answer() {
    let client = Arc::new(ScriptedChatClient::new());
    client.push_update_batch(vec![
        ChatResponseUpdate::default()
            .with_role(Role::Assistant)
            .with_text("The answer "),
        ChatResponseUpdate::default().with_text("is 7."),
        ChatResponseUpdate::default()
            .with_finish_reason(FinishReason::Stop)
            .with_usage(UsageDetails::new(5, 3, 8)),
    ]);

    let agent = Agent::builder(client).build();
    let cancellation = CancellationToken::new();

    let mut stream = agent
        .run_stream(vec![Message::user("What is 3+4?")], RunOptions::new())
        .await
        .expect("stream should start");

    let response = stream
        .final_response(&cancellation)
        .await
        .expect("merge should work");
    assert_eq!(response.text(), "The answer is 7.");
    assert_eq!(response.usage.total_tokens, 8);
}
