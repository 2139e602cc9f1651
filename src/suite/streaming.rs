use std::sync::Arc;

use super::Context;
use crate::common::Result;
use crate::testing::check;
use crate::testing::{CheckResult, Registry};

const CATEGORY: &str = "streaming";

pub(super) fn register(registry: &mut Registry<Context>) -> Result<()> {
    registry.register("basic_streaming", CATEGORY, basic_streaming)?;
    registry.register("chunk_structure", CATEGORY, chunk_structure)?;
    registry.register("first_chunk_role", CATEGORY, first_chunk_role)?;
    registry.register("content_chunks", CATEGORY, content_chunks)?;
    registry.register("final_chunk_finish_reason", CATEGORY, final_chunk_finish_reason)?;
    registry.register("incremental_content", CATEGORY, incremental_content)?;
    registry.register("stream_usage_included", CATEGORY, stream_usage_included)?;
    Ok(())
}

async fn basic_streaming(ctx: Arc<Context>) -> CheckResult {
    let request = ctx.request().user("Count from 1 to 5, one number per line.");
    let chunks = ctx.chat.create_stream_collected(&request).await?;
    check::greater(&chunks.len(), &1, "Should receive multiple chunks")
}

async fn chunk_structure(ctx: Arc<Context>) -> CheckResult {
    let chunks = ctx.chat.create_stream_collected(&ctx.request().user("Hi")).await?;
    for chunk in &chunks {
        let raw = chunk.raw();
        check::has_field(raw, "id", "Chunk should have 'id'")?;
        check::has_field(raw, "object", "Chunk should have 'object'")?;
        check::has_field(raw, "created", "Chunk should have 'created'")?;
        check::has_field(raw, "model", "Chunk should have 'model'")?;
        check::has_field(raw, "choices", "Chunk should have 'choices'")?;
        check::equal(
            &chunk.object(),
            &Some("chat.completion.chunk"),
            "Object should be 'chat.completion.chunk'",
        )?;
    }
    Ok(())
}

async fn first_chunk_role(ctx: Arc<Context>) -> CheckResult {
    let chunks = ctx.chat.create_stream_collected(&ctx.request().user("Hi")).await?;
    check::greater(&chunks.len(), &0, "Should have at least one chunk")?;

    let first = chunks.iter().find(|c| c.has_choices());
    check::is_present(&first.map(|c| c.raw()), "Should have chunk with choices")?;
    let Some(first) = first else {
        return Ok(());
    };

    check::has_field(first.delta(), "role", "First delta should have 'role'")?;
    check::equal(&first.role(), &Some("assistant"), "First delta role should be 'assistant'")
}

async fn content_chunks(ctx: Arc<Context>) -> CheckResult {
    let request = ctx.request().user("Say 'hello world' and nothing else.");
    let chunks = ctx.chat.create_stream_collected(&request).await?;
    let content: String = chunks.iter().filter_map(|c| c.content()).collect();
    check::contains(
        &content.to_lowercase(),
        "hello",
        "Streamed content should contain 'hello'",
    )
}

async fn final_chunk_finish_reason(ctx: Arc<Context>) -> CheckResult {
    let chunks = ctx.chat.create_stream_collected(&ctx.request().user("Hi")).await?;
    let finish_reason = chunks
        .iter()
        .rev()
        .filter(|c| c.has_choices())
        .find_map(|c| c.finish_reason().filter(|r| !r.is_empty()));

    check::is_present(&finish_reason, "Should have finish_reason in final chunk")?;
    check::equal(&finish_reason, &Some("stop"), "Finish reason should be 'stop'")
}

async fn incremental_content(ctx: Arc<Context>) -> CheckResult {
    let request = ctx.request().user("Write a haiku about coding.");
    let chunks = ctx.chat.create_stream_collected(&request).await?;
    let content_chunks = chunks.iter().filter(|c| c.content().is_some()).count();
    check::greater(
        &content_chunks,
        &1,
        "Should have multiple content chunks (incremental)",
    )
}

async fn stream_usage_included(ctx: Arc<Context>) -> CheckResult {
    let request = ctx
        .request()
        .user("Hi")
        .param("stream_options", serde_json::json!({"include_usage": true}));
    let chunks = ctx.chat.create_stream_collected(&request).await?;

    let usage = chunks
        .iter()
        .map(|c| c.usage())
        .find(|u| !u.is_null());
    check::is_present(&usage, "Should have chunk with usage when include_usage=true")?;
    let Some(usage) = usage else {
        return Ok(());
    };

    check::has_field(usage, "prompt_tokens", "Usage should have prompt_tokens")?;
    check::has_field(usage, "completion_tokens", "Usage should have completion_tokens")?;
    check::has_field(usage, "total_tokens", "Usage should have total_tokens")
}
