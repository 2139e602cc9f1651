use serde_json::json;
use std::sync::Arc;

use super::Context;
use crate::common::Result;
use crate::testing::check;
use crate::testing::{CheckResult, Registry};

const CATEGORY: &str = "basic_chat";

pub(super) fn register(registry: &mut Registry<Context>) -> Result<()> {
    registry.register("single_turn", CATEGORY, single_turn)?;
    registry.register("response_structure", CATEGORY, response_structure)?;
    registry.register("choice_structure", CATEGORY, choice_structure)?;
    registry.register("message_structure", CATEGORY, message_structure)?;
    registry.register("multi_turn_memory", CATEGORY, multi_turn_memory)?;
    registry.register("system_message", CATEGORY, system_message)?;
    registry.register("empty_user_content", CATEGORY, empty_user_content)?;
    registry.register("long_content", CATEGORY, long_content)?;
    Ok(())
}

async fn single_turn(ctx: Arc<Context>) -> CheckResult {
    let request = ctx.request().user("Say exactly 'hello' and nothing else.");
    let completion = ctx.chat.create(&request).await?;
    check::greater(&completion.choices().len(), &0, "Should have at least one choice")?;
    let content = completion.content().unwrap_or_default().to_lowercase();
    check::contains(&content, "hello", "Response should contain 'hello'")
}

async fn response_structure(ctx: Arc<Context>) -> CheckResult {
    let completion = ctx.chat.create(&ctx.request().user("Hi")).await?;
    check::is_present(completion.id(), "Response should have 'id'")?;
    check::equal(
        &completion.object(),
        &Some("chat.completion"),
        "Object should be 'chat.completion'",
    )?;
    check::is_present(completion.created(), "Response should have 'created'")?;
    check::is_present(completion.model(), "Response should have 'model'")?;
    check::is_present(&completion.raw()["choices"], "Response should have 'choices'")?;
    check::is_present(completion.usage(), "Response should have 'usage'")
}

async fn choice_structure(ctx: Arc<Context>) -> CheckResult {
    let completion = ctx.chat.create(&ctx.request().user("Hi")).await?;
    let choice = completion.first_choice();
    check::has_field(choice, "index", "Choice should have 'index'")?;
    check::has_field(choice, "message", "Choice should have 'message'")?;
    check::has_field(choice, "finish_reason", "Choice should have 'finish_reason'")?;
    check::equal(&choice["index"], &json!(0), "First choice index should be 0")
}

async fn message_structure(ctx: Arc<Context>) -> CheckResult {
    let completion = ctx.chat.create(&ctx.request().user("Hi")).await?;
    let message = completion.message();
    check::has_field(message, "role", "Message should have 'role'")?;
    check::has_field(message, "content", "Message should have 'content'")?;
    check::equal(&message["role"], &json!("assistant"), "Message role should be 'assistant'")?;
    check::is_present(&message["content"], "Message content should not be None")
}

async fn multi_turn_memory(ctx: Arc<Context>) -> CheckResult {
    const INTRO: &str = "My name is Alice. Just say 'Got it'.";

    let first = ctx.chat.create(&ctx.request().user(INTRO)).await?;
    let reply = first.content().unwrap_or_default();

    let request = ctx
        .request()
        .user(INTRO)
        .assistant(reply)
        .user("What is my name? Say just the name.");
    let second = ctx.chat.create(&request).await?;

    let content = second.content().unwrap_or_default().to_lowercase();
    check::contains(&content, "alice", "Model should remember the name 'Alice'")
}

async fn system_message(ctx: Arc<Context>) -> CheckResult {
    let request = ctx
        .request()
        .system("You are a pirate. Always say 'Arrr!' at the start of every response.")
        .user("Hello");
    let completion = ctx.chat.create(&request).await?;
    let content = completion.content().unwrap_or_default().to_lowercase();
    check::contains(&content, "arrr", "Response should contain pirate speak")
}

async fn empty_user_content(ctx: Arc<Context>) -> CheckResult {
    // the reply itself is unconstrained; the server must not reject the turn
    let completion = ctx.chat.create(&ctx.request().user("")).await?;
    check::is_present(
        &completion.raw()["choices"],
        "Should have choices even with empty content",
    )
}

async fn long_content(ctx: Arc<Context>) -> CheckResult {
    let long_text = "This is a test message. ".repeat(100);
    let request = ctx
        .request()
        .user(&format!("Summarize this in one word: {}", long_text));
    let completion = ctx.chat.create(&request).await?;
    check::is_present(&completion.raw()["choices"], "Should handle long content")?;
    check::is_present(&completion.message()["content"], "Should have response")
}
