//! Sampling and generation parameters
//!
//! Most parameters are only checked for acceptance: some providers honour
//! them, others drop them silently.

use serde_json::{json, Value};
use std::sync::Arc;

use super::Context;
use crate::common::Result;
use crate::testing::check;
use crate::testing::{CheckResult, Registry};

const CATEGORY: &str = "parameters";

pub(super) fn register(registry: &mut Registry<Context>) -> Result<()> {
    registry.register("temperature_accepted", CATEGORY, temperature_accepted)?;
    registry.register("top_p_accepted", CATEGORY, top_p_accepted)?;
    registry.register("max_tokens_accepted", CATEGORY, max_tokens_accepted)?;
    registry.register("presence_penalty_accepted", CATEGORY, presence_penalty_accepted)?;
    registry.register("frequency_penalty_accepted", CATEGORY, frequency_penalty_accepted)?;
    registry.register("stop_accepted", CATEGORY, stop_accepted)?;
    registry.register("response_format_accepted", CATEGORY, response_format_accepted)?;
    registry.register("seed_accepted", CATEGORY, seed_accepted)?;
    registry.register("reasoning_effort_param", CATEGORY, reasoning_effort_param)?;
    registry.register("copilot_max_tokens_effective", CATEGORY, copilot_max_tokens_effective)?;
    Ok(())
}

/// Send one request carrying `key: value` and expect a normal completion
async fn accepted(ctx: &Context, prompt: &str, key: &str, value: Value) -> CheckResult {
    let request = ctx.request().user(prompt).param(key, value);
    let completion = ctx.chat.create(&request).await?;
    check::is_present(
        &completion.raw()["choices"],
        &format!("{} should be accepted", key),
    )
}

async fn temperature_accepted(ctx: Arc<Context>) -> CheckResult {
    accepted(&ctx, "Hi", "temperature", json!(0.5)).await
}

async fn top_p_accepted(ctx: Arc<Context>) -> CheckResult {
    accepted(&ctx, "Hi", "top_p", json!(0.9)).await
}

async fn max_tokens_accepted(ctx: Arc<Context>) -> CheckResult {
    accepted(&ctx, "Hi", "max_tokens", json!(100)).await
}

async fn presence_penalty_accepted(ctx: Arc<Context>) -> CheckResult {
    accepted(&ctx, "Hi", "presence_penalty", json!(0.5)).await
}

async fn frequency_penalty_accepted(ctx: Arc<Context>) -> CheckResult {
    accepted(&ctx, "Hi", "frequency_penalty", json!(0.5)).await
}

async fn stop_accepted(ctx: Arc<Context>) -> CheckResult {
    accepted(&ctx, "Count from 1 to 10", "stop", json!(["5"])).await
}

async fn response_format_accepted(ctx: Arc<Context>) -> CheckResult {
    accepted(
        &ctx,
        "Return a JSON object with key 'greeting' and value 'hello'",
        "response_format",
        json!({"type": "json_object"}),
    )
    .await
}

async fn seed_accepted(ctx: Arc<Context>) -> CheckResult {
    accepted(&ctx, "Hi", "seed", json!(42)).await
}

async fn reasoning_effort_param(ctx: Arc<Context>) -> CheckResult {
    check::skip_if(
        !ctx.provider().supports_reasoning_headers,
        "reasoning_effort is ChatGPT-only",
    )?;
    accepted(&ctx, "Hi", "reasoning_effort", json!("high")).await
}

async fn copilot_max_tokens_effective(ctx: Arc<Context>) -> CheckResult {
    check::skip_if(
        !ctx.provider().supports_sampling_params,
        "max_tokens limiting is Copilot-only",
    )?;
    let request = ctx
        .request()
        .user("Write a 500 word essay about the history of computing.")
        .param("max_tokens", 20);
    let completion = ctx.chat.create(&request).await?;
    check::is_present(&completion.raw()["choices"], "Should get response")?;

    // 20 tokens is well under 500 characters for any tokenizer in use
    let length = completion.content().unwrap_or_default().chars().count();
    check::less(&length, &500, "Response should be truncated by max_tokens")
}
