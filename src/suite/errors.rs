//! Request validation
//!
//! These go through the raw HTTP client so the status code and error body
//! can be asserted on directly.

use serde_json::{json, Value};
use std::sync::Arc;

use super::Context;
use crate::client::HttpResponse;
use crate::common::Result;
use crate::testing::check;
use crate::testing::{CheckError, CheckResult, Registry};

const CATEGORY: &str = "errors";
const COMPLETIONS_PATH: &str = "/v1/chat/completions";

pub(super) fn register(registry: &mut Registry<Context>) -> Result<()> {
    registry.register("missing_model", CATEGORY, missing_model)?;
    registry.register("invalid_model", CATEGORY, invalid_model)?;
    registry.register("missing_messages", CATEGORY, missing_messages)?;
    registry.register("empty_messages", CATEGORY, empty_messages)?;
    registry.register("invalid_role", CATEGORY, invalid_role)?;
    registry.register("tool_missing_call_id", CATEGORY, tool_missing_call_id)?;
    registry.register("error_structure", CATEGORY, error_structure)?;
    Ok(())
}

async fn post(ctx: &Context, body: Value) -> std::result::Result<HttpResponse, CheckError> {
    Ok(ctx.http.post_json(COMPLETIONS_PATH, &body).await?)
}

/// Lowercased `error.message`, empty when missing
fn error_message(body: &Value) -> String {
    body["error"]["message"]
        .as_str()
        .unwrap_or_default()
        .to_lowercase()
}

async fn missing_model(ctx: Arc<Context>) -> CheckResult {
    let response = post(&ctx, json!({"messages": [{"role": "user", "content": "Hi"}]})).await?;
    check::status_code_equals(&response, 400, "Missing model should return 400")?;
    let body = response.json()?;
    check::has_field(&body, "error", "Should have error object")?;
    check::contains(&error_message(&body), "model", "Error should mention 'model'")
}

async fn invalid_model(ctx: Arc<Context>) -> CheckResult {
    let body = json!({
        "model": format!("{}/nonexistent-model-xyz", ctx.provider().id),
        "messages": [{"role": "user", "content": "Hi"}],
    });
    let response = post(&ctx, body).await?;
    check::status_code_equals(&response, 404, "Invalid model should return 404")
}

async fn missing_messages(ctx: Arc<Context>) -> CheckResult {
    let response = post(&ctx, json!({"model": ctx.model()})).await?;
    check::status_code_equals(&response, 400, "Missing messages should return 400")
}

async fn empty_messages(ctx: Arc<Context>) -> CheckResult {
    let response = post(&ctx, json!({"model": ctx.model(), "messages": []})).await?;
    check::status_code_equals(&response, 400, "Empty messages should return 400")
}

async fn invalid_role(ctx: Arc<Context>) -> CheckResult {
    let body = json!({
        "model": ctx.model(),
        "messages": [{"role": "invalid_role", "content": "Hi"}],
    });
    let response = post(&ctx, body).await?;
    check::status_code_equals(&response, 400, "Invalid role should return 400")?;
    let body = response.json()?;
    check::contains(&error_message(&body), "role", "Error should mention 'role'")
}

async fn tool_missing_call_id(ctx: Arc<Context>) -> CheckResult {
    let body = json!({
        "model": ctx.model(),
        "messages": [
            {"role": "user", "content": "Hi"},
            {"role": "tool", "content": "result"},
        ],
    });
    let response = post(&ctx, body).await?;
    check::status_code_equals(&response, 400, "Tool without tool_call_id should return 400")
}

async fn error_structure(ctx: Arc<Context>) -> CheckResult {
    let response = post(&ctx, json!({"messages": [{"role": "user", "content": "Hi"}]})).await?;
    check::status_code_equals(&response, 400, "Should return 400")?;
    let body = response.json()?;
    check::has_field(&body, "error", "Should have 'error' object")?;
    check::has_field(&body["error"], "message", "Error should have 'message'")?;
    check::has_field(&body["error"], "type", "Error should have 'type'")
}
