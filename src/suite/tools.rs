//! Function calling, including multi-turn tool round trips

use serde_json::{json, Value};
use std::sync::Arc;

use super::Context;
use crate::client::types::{assistant_tool_calls, empty_tool, tool, tool_result, StreamedToolCall};
use crate::client::Completion;
use crate::common::Result;
use crate::testing::check::{self, JsonType};
use crate::testing::{CheckError, CheckResult, Registry};

const CATEGORY: &str = "tools";

pub(super) fn register(registry: &mut Registry<Context>) -> Result<()> {
    registry.register("single_tool_definition", CATEGORY, single_tool_definition)?;
    registry.register("multiple_tools", CATEGORY, multiple_tools)?;
    registry.register("tool_call_triggered", CATEGORY, tool_call_triggered)?;
    registry.register("tool_call_structure", CATEGORY, tool_call_structure)?;
    registry.register("tool_call_arguments_json", CATEGORY, tool_call_arguments_json)?;
    registry.register("tool_result_handling", CATEGORY, tool_result_handling)?;
    registry.register("tool_choice_auto", CATEGORY, tool_choice_auto)?;
    registry.register("tool_choice_none", CATEGORY, tool_choice_none)?;
    registry.register("streaming_tool_calls", CATEGORY, streaming_tool_calls)?;
    registry.register("mcp_multi_turn_conversation", CATEGORY, mcp_multi_turn_conversation)?;
    registry.register("mcp_complex_arguments", CATEGORY, mcp_complex_arguments)?;
    registry.register("mcp_parallel_tool_calls", CATEGORY, mcp_parallel_tool_calls)?;
    registry.register("mcp_tool_choice_specific", CATEGORY, mcp_tool_choice_specific)?;
    registry.register("mcp_streaming_accumulation", CATEGORY, mcp_streaming_accumulation)?;
    registry.register("mcp_multiple_tool_results", CATEGORY, mcp_multiple_tool_results)?;
    registry.register("mcp_error_in_tool_result", CATEGORY, mcp_error_in_tool_result)?;
    Ok(())
}

fn weather_tool(description: &str, key: &str) -> Value {
    tool(
        "get_weather",
        description,
        json!({
            "type": "object",
            "properties": {key: {"type": "string"}},
            "required": [key],
        }),
    )
}

/// First tool call of a completion, failing the check when there is none
fn first_tool_call(completion: &Completion, msg: &str) -> std::result::Result<Value, CheckError> {
    let calls = completion.tool_calls();
    check::greater(&calls.len(), &0, msg)?;
    Ok(calls[0].clone())
}

/// Parse a tool call's `function.arguments` string
fn parse_arguments(call: &Value) -> std::result::Result<Value, CheckError> {
    let raw = call["function"]["arguments"].as_str().unwrap_or_default();
    serde_json::from_str(raw).map_err(|e| {
        CheckError::mismatch(
            format!("Arguments should be valid JSON: {}", e),
            json!("JSON object"),
            json!(raw),
        )
    })
}

/// Replay a tool call as the assistant turn of a follow-up request
fn replay(call: &Value) -> Value {
    assistant_tool_calls(&[json!({
        "id": call["id"],
        "type": "function",
        "function": {
            "name": call["function"]["name"],
            "arguments": call["function"]["arguments"],
        },
    })])
}

async fn single_tool_definition(ctx: Arc<Context>) -> CheckResult {
    let request = ctx
        .request()
        .user("What's the weather in Paris? Use the tool.")
        .tools(vec![weather_tool("Get weather for a location", "location")]);
    let completion = ctx.chat.create(&request).await?;
    check::is_present(&completion.raw()["choices"], "Should accept tool definition")
}

async fn multiple_tools(ctx: Arc<Context>) -> CheckResult {
    let request = ctx.request().user("Hi").tools(vec![
        empty_tool("get_weather", "Get weather"),
        empty_tool("get_time", "Get current time"),
    ]);
    let completion = ctx.chat.create(&request).await?;
    check::is_present(&completion.raw()["choices"], "Should accept multiple tools")
}

async fn tool_call_triggered(ctx: Arc<Context>) -> CheckResult {
    let request = ctx
        .request()
        .user("What's the weather in Tokyo? You must use the get_weather tool.")
        .tools(vec![weather_tool("Get the current weather for a location", "location")])
        .tool_choice("required");
    let completion = ctx.chat.create(&request).await?;

    check::is_present(&completion.message()["tool_calls"], "Should have tool_calls")?;
    check::greater(
        &completion.tool_calls().len(),
        &0,
        "Should have at least one tool call",
    )
}

async fn tool_call_structure(ctx: Arc<Context>) -> CheckResult {
    let request = ctx
        .request()
        .user("Call the test_func tool now.")
        .tools(vec![empty_tool("test_func", "A test function")])
        .tool_choice("required");
    let completion = ctx.chat.create(&request).await?;

    let call = first_tool_call(&completion, "Should have tool_calls")?;
    check::has_field(&call, "id", "Tool call should have 'id'")?;
    check::has_field(&call, "type", "Tool call should have 'type'")?;
    check::has_field(&call, "function", "Tool call should have 'function'")?;
    check::equal(&call["type"], &json!("function"), "Tool call type should be 'function'")?;
    check::has_field(&call["function"], "name", "Function should have 'name'")?;
    check::has_field(&call["function"], "arguments", "Function should have 'arguments'")
}

async fn tool_call_arguments_json(ctx: Arc<Context>) -> CheckResult {
    let greet = tool(
        "greet",
        "Greet someone",
        json!({
            "type": "object",
            "properties": {"name": {"type": "string"}},
            "required": ["name"],
        }),
    );
    let request = ctx
        .request()
        .user("Call greet with name 'Bob'.")
        .tools(vec![greet])
        .tool_choice("required");
    let completion = ctx.chat.create(&request).await?;

    let call = first_tool_call(&completion, "Should have tool_calls")?;
    let args = parse_arguments(&call)?;
    check::of_type(&args, JsonType::Object, "Arguments should parse to dict")
}

async fn tool_result_handling(ctx: Arc<Context>) -> CheckResult {
    const PROMPT: &str = "Call get_number tool.";
    let tools = vec![empty_tool("get_number", "Get a number")];

    let request = ctx
        .request()
        .user(PROMPT)
        .tools(tools.clone())
        .tool_choice("required");
    let first = ctx.chat.create(&request).await?;
    let call = first_tool_call(&first, "Should have tool call")?;

    let call_id = call["id"].as_str().unwrap_or_default();
    let follow_up = ctx
        .request()
        .user(PROMPT)
        .message(replay(&call))
        .message(tool_result(call_id, "42"))
        .tools(tools);
    let second = ctx.chat.create(&follow_up).await?;

    let content = second.content();
    check::is_present(&content, "Should have response after tool result")?;
    check::contains(
        content.unwrap_or_default(),
        "42",
        "Response should reference the tool result",
    )
}

async fn tool_choice_auto(ctx: Arc<Context>) -> CheckResult {
    let request = ctx
        .request()
        .user("Hi")
        .tools(vec![empty_tool("test_func", "Test function")])
        .tool_choice("auto");
    let completion = ctx.chat.create(&request).await?;
    check::is_present(&completion.raw()["choices"], "tool_choice auto should work")
}

async fn tool_choice_none(ctx: Arc<Context>) -> CheckResult {
    let request = ctx
        .request()
        .user("Call the must_call tool.")
        .tools(vec![empty_tool("must_call", "You must call this")])
        .tool_choice("none");
    let completion = ctx.chat.create(&request).await?;
    check::is_false(
        !completion.tool_calls().is_empty(),
        "tool_choice none should prevent tool calls",
    )
}

async fn streaming_tool_calls(ctx: Arc<Context>) -> CheckResult {
    let request = ctx
        .request()
        .user("Call get_data tool.")
        .tools(vec![empty_tool("get_data", "Get data")])
        .tool_choice("required");
    let chunks = ctx.chat.create_stream_collected(&request).await?;

    let found = chunks
        .iter()
        .any(|c| c.has_choices() && !c.tool_calls().is_empty());
    check::is_true(found, "Should have tool call chunks in stream")
}

async fn mcp_multi_turn_conversation(ctx: Arc<Context>) -> CheckResult {
    const PROMPT: &str =
        "Read the file /tmp/test.txt and tell me what's in it. Use the read_file tool.";
    let tools = vec![tool(
        "read_file",
        "Read contents of a file",
        json!({
            "type": "object",
            "properties": {"path": {"type": "string", "description": "File path to read"}},
            "required": ["path"],
        }),
    )];

    let request = ctx
        .request()
        .user(PROMPT)
        .tools(tools.clone())
        .tool_choice("required");
    let first = ctx.chat.create(&request).await?;

    let call = first_tool_call(&first, "Should have at least one tool call")?;
    check::equal(
        &call["function"]["name"],
        &json!("read_file"),
        "Tool name should be 'read_file'",
    )?;
    let args = parse_arguments(&call)?;
    check::has_field(&args, "path", "Arguments should have 'path'")?;

    let call_id = call["id"].as_str().unwrap_or_default();
    let follow_up = ctx
        .request()
        .user(PROMPT)
        .message(replay(&call))
        .message(tool_result(call_id, "Hello from the test file!"))
        .tools(tools);
    let second = ctx.chat.create(&follow_up).await?;

    let content = second.content();
    check::is_present(&content, "Should have response content")?;
    check::contains(
        &content.unwrap_or_default().to_lowercase(),
        "hello",
        "Response should reference file content",
    )
}

async fn mcp_complex_arguments(ctx: Arc<Context>) -> CheckResult {
    let create_task = tool(
        "create_task",
        "Create a new task with metadata",
        json!({
            "type": "object",
            "properties": {
                "title": {"type": "string"},
                "tags": {"type": "array", "items": {"type": "string"}},
                "metadata": {
                    "type": "object",
                    "properties": {
                        "priority": {"type": "string", "enum": ["low", "medium", "high"]},
                        "due_date": {"type": "string"},
                    },
                },
            },
            "required": ["title"],
        }),
    );
    let request = ctx
        .request()
        .user("Create a task titled 'Test task' with tags ['urgent', 'work'] and high priority. Use the create_task tool.")
        .tools(vec![create_task])
        .tool_choice("required");
    let completion = ctx.chat.create(&request).await?;

    let call = first_tool_call(&completion, "Should have tool call")?;
    let args = parse_arguments(&call)?;
    check::has_field(&args, "title", "Arguments should have 'title'")?;
    check::of_type(&args["title"], JsonType::String, "Title should be string")
}

async fn mcp_parallel_tool_calls(ctx: Arc<Context>) -> CheckResult {
    let request = ctx
        .request()
        .user("What's the weather in Paris and Tokyo? Get both using the tool.")
        .tools(vec![weather_tool("Get weather for a city", "city")])
        .tool_choice("required")
        .param("parallel_tool_calls", true);
    let completion = ctx.chat.create(&request).await?;

    check::is_present(&completion.message()["tool_calls"], "Should have tool calls")?;
    // parallel calls are permitted, not required
    check::greater_or_equal(
        &completion.tool_calls().len(),
        &1,
        "Should have at least one tool call",
    )
}

async fn mcp_tool_choice_specific(ctx: Arc<Context>) -> CheckResult {
    check::skip_if(
        !ctx.provider().supports_named_tool_choice,
        "ChatGPT doesn't support tool_choice with specific function",
    )?;
    let request = ctx
        .request()
        .user("Call func_a.")
        .tools(vec![
            empty_tool("func_a", "Function A"),
            empty_tool("func_b", "Function B"),
        ])
        .tool_choice(json!({"type": "function", "function": {"name": "func_a"}}));
    let completion = ctx.chat.create(&request).await?;

    let call = first_tool_call(&completion, "Should have tool call")?;
    check::equal(
        &call["function"]["name"],
        &json!("func_a"),
        "Should call func_a specifically",
    )
}

async fn mcp_streaming_accumulation(ctx: Arc<Context>) -> CheckResult {
    let search = tool(
        "search",
        "Search for information",
        json!({
            "type": "object",
            "properties": {"query": {"type": "string"}},
            "required": ["query"],
        }),
    );
    let request = ctx
        .request()
        .user("Search for 'test query'. Use the search tool.")
        .tools(vec![search])
        .tool_choice("required");
    let chunks = ctx.chat.create_stream_collected(&request).await?;

    let call = StreamedToolCall::accumulate(chunks.iter().filter(|c| c.has_choices()));
    check::is_present(&call.id, "Should have tool call ID")?;
    check::equal(&call.name.as_deref(), &Some("search"), "Tool name should be 'search'")?;
    check::greater(&call.arguments.len(), &0, "Should have accumulated arguments")?;

    let args = parse_arguments(&json!({"function": {"arguments": call.arguments}}))?;
    check::has_field(&args, "query", "Arguments should have 'query'")
}

async fn mcp_multiple_tool_results(ctx: Arc<Context>) -> CheckResult {
    let get_data = tool(
        "get_data",
        "Get data by ID",
        json!({
            "type": "object",
            "properties": {"id": {"type": "integer"}},
            "required": ["id"],
        }),
    );
    let request = ctx
        .request()
        .user("Get data for IDs 1 and 2, then summarize.")
        .message(assistant_tool_calls(&[
            json!({"id": "call_1", "type": "function", "function": {"name": "get_data", "arguments": "{\"id\": 1}"}}),
            json!({"id": "call_2", "type": "function", "function": {"name": "get_data", "arguments": "{\"id\": 2}"}}),
        ]))
        .message(tool_result("call_1", r#"{"value": "first"}"#))
        .message(tool_result("call_2", r#"{"value": "second"}"#))
        .tools(vec![get_data]);
    let completion = ctx.chat.create(&request).await?;

    let content = completion.content();
    check::is_present(&content, "Should have response")?;
    let content = content.unwrap_or_default().to_lowercase();
    check::is_true(
        content.contains("first") || content.contains("second"),
        "Response should reference tool results",
    )
}

async fn mcp_error_in_tool_result(ctx: Arc<Context>) -> CheckResult {
    let request = ctx
        .request()
        .user("Run the risky operation.")
        .message(assistant_tool_calls(&[json!({
            "id": "call_err",
            "type": "function",
            "function": {"name": "risky_operation", "arguments": "{}"},
        })]))
        .message(tool_result(
            "call_err",
            r#"{"error": "Operation failed: permission denied"}"#,
        ))
        .tools(vec![empty_tool("risky_operation", "An operation that might fail")]);
    let completion = ctx.chat.create(&request).await?;
    check::is_present(
        &completion.content(),
        "Should have response even with error result",
    )
}
