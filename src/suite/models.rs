//! Model name routing

use serde_json::json;
use std::sync::Arc;

use super::provider::bare_model;
use super::Context;
use crate::client::{ChatRequest, ClientError};
use crate::common::Result;
use crate::testing::check;
use crate::testing::{CheckResult, Registry};

const CATEGORY: &str = "models";

pub(super) fn register(registry: &mut Registry<Context>) -> Result<()> {
    registry.register("model_default", CATEGORY, model_default)?;
    registry.register("model_effort_suffix_high", CATEGORY, model_effort_suffix_high)?;
    registry.register("model_effort_suffix_low", CATEGORY, model_effort_suffix_low)?;
    registry.register(
        "model_missing_provider_prefix",
        CATEGORY,
        model_missing_provider_prefix,
    )?;
    registry.register("model_invalid_404", CATEGORY, model_invalid_404)?;
    Ok(())
}

async fn model_default(ctx: Arc<Context>) -> CheckResult {
    let completion = ctx.chat.create(&ctx.request().user("Say 'ok'")).await?;
    check::is_present(
        &completion.raw()["choices"],
        &format!("{} should work", ctx.model()),
    )
}

async fn effort_suffix(ctx: &Context, suffix: &str) -> CheckResult {
    check::skip_if(
        !ctx.provider().supports_effort_suffix,
        "Effort suffixes are ChatGPT-only",
    )?;
    let model = format!("{}-{}", ctx.model(), suffix);
    let request = ChatRequest::new(model).user("Say 'ok'");
    let completion = ctx.chat.create(&request).await?;
    check::is_present(&completion.raw()["choices"], "Effort suffix should work")
}

async fn model_effort_suffix_high(ctx: Arc<Context>) -> CheckResult {
    effort_suffix(&ctx, "high").await
}

async fn model_effort_suffix_low(ctx: Arc<Context>) -> CheckResult {
    effort_suffix(&ctx, "low").await
}

async fn model_missing_provider_prefix(ctx: Arc<Context>) -> CheckResult {
    let body = json!({
        "model": bare_model(ctx.model()),
        "messages": [{"role": "user", "content": "Hi"}],
    });
    let response = ctx.http.post_json("/v1/chat/completions", &body).await?;
    check::status_code_equals(
        &response,
        400,
        "Model without provider prefix should return 400",
    )
}

async fn model_invalid_404(ctx: Arc<Context>) -> CheckResult {
    let model = format!("{}/invalid-model-xyz", ctx.provider().id);
    let request = ChatRequest::new(model).user("Hi");

    match ctx.chat.create(&request).await {
        Ok(_) => check::fail("Should have raised an error for invalid model"),
        Err(ClientError::Api {
            status, message, ..
        }) => {
            let text = message.to_lowercase();
            check::is_true(
                status == 404 || text.contains("not found") || text.contains("does not exist"),
                &format!("Error should indicate model not found: HTTP {}: {}", status, message),
            )
        }
        Err(e) => Err(e.into()),
    }
}
