use serde_json::json;
use std::sync::Arc;

use super::Context;
use crate::client::types::empty_tool;
use crate::common::Result;
use crate::testing::check::{self, JsonType};
use crate::testing::{CheckResult, Registry};

const CATEGORY: &str = "response_format";

/// 2020-01-01T00:00:00Z
const EARLIEST_CREATED: i64 = 1_577_836_800;
/// 2100-01-01T00:00:00Z
const LATEST_CREATED: i64 = 4_102_444_800;

pub(super) fn register(registry: &mut Registry<Context>) -> Result<()> {
    registry.register("usage_fields", CATEGORY, usage_fields)?;
    registry.register("system_fingerprint_present", CATEGORY, system_fingerprint_present)?;
    registry.register("finish_reason_stop", CATEGORY, finish_reason_stop)?;
    registry.register("finish_reason_tool_calls", CATEGORY, finish_reason_tool_calls)?;
    registry.register("id_format", CATEGORY, id_format)?;
    registry.register("created_timestamp", CATEGORY, created_timestamp)?;
    Ok(())
}

async fn usage_fields(ctx: Arc<Context>) -> CheckResult {
    let completion = ctx.chat.create(&ctx.request().user("Hi")).await?;
    let usage = completion.usage();
    check::is_present(usage, "Should have usage")?;
    check::has_field(usage, "prompt_tokens", "Usage should have prompt_tokens")?;
    check::has_field(usage, "completion_tokens", "Usage should have completion_tokens")?;
    check::has_field(usage, "total_tokens", "Usage should have total_tokens")?;

    let prompt = &usage["prompt_tokens"];
    let completion_tokens = &usage["completion_tokens"];
    let total = &usage["total_tokens"];
    check::of_type(prompt, JsonType::Integer, "prompt_tokens should be an integer")?;
    check::of_type(completion_tokens, JsonType::Integer, "completion_tokens should be an integer")?;
    check::of_type(total, JsonType::Integer, "total_tokens should be an integer")?;

    let prompt = prompt.as_i64().unwrap_or_default();
    let completion_tokens = completion_tokens.as_i64().unwrap_or_default();
    check::greater(&prompt, &0, "prompt_tokens should be > 0")?;
    check::greater_or_equal(&completion_tokens, &0, "completion_tokens should be >= 0")?;
    check::equal(
        total,
        &json!(prompt + completion_tokens),
        "total_tokens should equal sum",
    )
}

async fn system_fingerprint_present(ctx: Arc<Context>) -> CheckResult {
    let completion = ctx.chat.create(&ctx.request().user("Hi")).await?;
    // null is allowed; the key itself must be there
    check::has_field(
        completion.raw(),
        "system_fingerprint",
        "Should have system_fingerprint",
    )
}

async fn finish_reason_stop(ctx: Arc<Context>) -> CheckResult {
    let completion = ctx.chat.create(&ctx.request().user("Say 'ok'")).await?;
    check::equal(
        &completion.finish_reason(),
        &Some("stop"),
        "Finish reason should be 'stop'",
    )
}

async fn finish_reason_tool_calls(ctx: Arc<Context>) -> CheckResult {
    let request = ctx
        .request()
        .user("Call test tool.")
        .tools(vec![empty_tool("test", "Test")])
        .tool_choice("required");
    let completion = ctx.chat.create(&request).await?;
    check::equal(
        &completion.finish_reason(),
        &Some("tool_calls"),
        "Finish reason should be 'tool_calls'",
    )
}

async fn id_format(ctx: Arc<Context>) -> CheckResult {
    let completion = ctx.chat.create(&ctx.request().user("Hi")).await?;
    let id = completion.id();
    check::is_present(id, "Should have id")?;
    check::of_type(id, JsonType::String, "ID should be string")?;
    check::greater(
        &id.as_str().unwrap_or_default().len(),
        &0,
        "ID should not be empty",
    )
}

async fn created_timestamp(ctx: Arc<Context>) -> CheckResult {
    let completion = ctx.chat.create(&ctx.request().user("Hi")).await?;
    let created = completion.created();
    check::is_present(created, "Should have created")?;
    check::of_type(created, JsonType::Integer, "created should be int")?;

    let created = created.as_i64().unwrap_or_default();
    check::greater(&created, &EARLIEST_CREATED, "created should be after 2020")?;
    check::less(&created, &LATEST_CREATED, "created should be before 2100")
}
